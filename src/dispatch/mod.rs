//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! AgentRequest (id, message, analysis)
//!     → routing::Router (intent → target)
//!     → resilience::CircuitBreakerRegistry (target → breaker)
//!     → transport::Transport (urgent → sync, else queued)
//!     → breaker.call(transport)
//!     → DispatchOutcome (Completed | Queued | Failure)
//! ```

pub mod dispatcher;
pub mod error;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use types::{
    AgentRequest, AgentResponse, Analysis, DispatchFailure, DispatchOutcome, DispatchPayload,
    ErrorKind, JsonMap, ResponseStatus,
};
