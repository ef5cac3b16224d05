//! Dispatch error types.

use thiserror::Error;

use crate::dispatch::types::{DispatchFailure, ErrorKind};
use crate::resilience::BreakerError;
use crate::transport::TransportError;

/// Why a dispatch did not succeed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("circuit breaker for {target} is open")]
    CircuitOpen { target: String },

    #[error("request to {target} failed: {source}")]
    Downstream { target: String, source: TransportError },

    #[error("could not enqueue request for {target}: {source}")]
    Enqueue { target: String, source: TransportError },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            DispatchError::Downstream { source, .. } if source.is_timeout() => ErrorKind::DownstreamTimeout,
            DispatchError::Downstream { .. } => ErrorKind::DownstreamFailure,
            DispatchError::Enqueue { .. } => ErrorKind::EnqueueFailure,
        }
    }

    /// Map a breaker-wrapped synchronous call failure.
    pub(crate) fn from_sync(target: &str, err: BreakerError<TransportError>) -> Self {
        match err {
            BreakerError::Open => DispatchError::CircuitOpen { target: target.to_string() },
            BreakerError::Inner(source) => DispatchError::Downstream {
                target: target.to_string(),
                source,
            },
        }
    }

    /// Map a breaker-wrapped enqueue failure.
    pub(crate) fn from_enqueue(target: &str, err: BreakerError<TransportError>) -> Self {
        match err {
            BreakerError::Open => DispatchError::CircuitOpen { target: target.to_string() },
            BreakerError::Inner(source) => DispatchError::Enqueue {
                target: target.to_string(),
                source,
            },
        }
    }
}

impl From<DispatchError> for DispatchFailure {
    fn from(err: DispatchError) -> Self {
        DispatchFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
