//! Outbound transport subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher picks Transport from analysis.urgent:
//!     urgent     → http.rs  (POST request JSON, wait for the worker's reply)
//!     not urgent → queue.rs (declare "<target>_queue" durable, publish persistent)
//! ```
//!
//! # Design Decisions
//! - Both transports take the same `AgentRequest` payload
//! - A queue acknowledgment only means "durably accepted", never "processed"
//! - Implementations sit behind traits so the dispatcher can be tested
//!   without a network

pub mod http;
pub mod queue;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::dispatch::types::{AgentRequest, Analysis, JsonMap};

pub use http::HttpTransport;
pub use queue::{MemoryQueue, RabbitMqPublisher};

/// Delivery mode for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Request/response call; the worker's answer is returned.
    Sync,
    /// Durable enqueue; only acceptance by the queue is confirmed.
    Queued,
}

impl Transport {
    /// Urgent requests go synchronously, everything else is queued.
    pub fn for_analysis(analysis: &Analysis) -> Self {
        if analysis.urgent {
            Transport::Sync
        } else {
            Transport::Queued
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Sync => "sync",
            Transport::Queued => "queued",
        }
    }
}

/// Name of the durable queue that feeds `target`.
pub fn queue_name(target: &str) -> String {
    format!("{}_queue", target)
}

/// Errors raised by either transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("broker did not accept message for {queue}: {reason}")]
    Broker { queue: String, reason: String },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }

    /// Classify a reqwest failure against `endpoint`.
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error, deadline: Duration) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(deadline)
        } else if let Some(status) = err.status() {
            TransportError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            TransportError::Decode {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        } else {
            TransportError::Connect {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

/// Request/response delivery to a worker.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Deliver `request` to `target` and return the worker's response body.
    async fn send(&self, target: &str, request: &AgentRequest) -> Result<JsonMap, TransportError>;
}

/// Durable asynchronous delivery.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Durably enqueue `request` on `queue`. Returns once the broker has
    /// accepted the message.
    async fn publish(&self, queue: &str, request: &AgentRequest) -> Result<(), TransportError>;
}
