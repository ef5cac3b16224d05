//! Response handling.
//!
//! # Responsibilities
//! - Map dispatch outcomes to HTTP status codes
//!
//! # Design Decisions
//! - Open breaker and queue outages are 503 (retry later)
//! - Downstream timeouts are 504 Gateway Timeout
//! - Other downstream failures are 502 Bad Gateway

use axum::http::StatusCode;

use crate::dispatch::types::{DispatchOutcome, ErrorKind};

pub fn status_for(outcome: &DispatchOutcome) -> StatusCode {
    match outcome {
        DispatchOutcome::Success(_) => StatusCode::OK,
        DispatchOutcome::Failure(failure) => match failure.kind {
            ErrorKind::CircuitOpen | ErrorKind::EnqueueFailure => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::DownstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::DownstreamFailure => StatusCode::BAD_GATEWAY,
        },
    }
}
