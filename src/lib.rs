//! Agent dispatch gateway library.
//!
//! Classifies incoming messages, picks a worker service for each one and
//! delivers it either synchronously over HTTP or durably through a queue,
//! with a circuit breaker per worker.

pub mod admin;
pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod transport;

pub use config::schema::GatewayConfig;
pub use dispatch::{AgentRequest, AgentResponse, DispatchOutcome, Dispatcher};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
