//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (parse body, assign request ID)
//!     → classifier (message → analysis)
//!     → dispatcher (analysis → target → transport)
//!     → response.rs (outcome → status code)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ProcessRequest, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
