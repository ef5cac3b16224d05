//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap synchronous downstream calls with a deadline
//! - Cancel the in-flight call cleanly when the deadline fires
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other transport errors

use std::future::Future;
use std::time::Duration;

use crate::transport::TransportError;

/// Run `call`, failing with [`TransportError::Timeout`] if it does not finish
/// within `deadline`. The call future is dropped on expiry.
pub async fn with_deadline<F, T>(deadline: Duration, call: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline)),
    }
}
