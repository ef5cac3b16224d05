//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch to target:
//!     → registry.rs (get or lazily create the target's breaker)
//!     → circuit_breaker.rs (admit or reject, then record the outcome)
//!     → timeouts.rs (deadline around synchronous calls)
//! ```
//!
//! # Design Decisions
//! - One breaker per target, never shared across targets
//! - Open → Half-Open happens on the next call attempt, never on a timer
//! - Timeouts are failures for breaker bookkeeping
//! - No automatic retries; callers decide whether to try again

pub mod circuit_breaker;
pub mod registry;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerSnapshot, CircuitBreaker, CircuitState};
pub use registry::CircuitBreakerRegistry;
