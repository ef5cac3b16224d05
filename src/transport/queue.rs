//! Asynchronous durable transport.
//!
//! # Responsibilities
//! - Declare the target's queue as durable before first use
//! - Publish the request JSON as a persistent message
//! - Report broker rejections and unreachable brokers as `TransportError`
//!
//! # Design Decisions
//! - RabbitMQ is reached through its management HTTP API, reusing the
//!   same HTTP client stack as the synchronous transport
//! - Queues are declared once per process; declaration is idempotent on
//!   the broker side so a restart simply declares again
//! - A publish that the broker reports as unrouted is a failure: nothing
//!   was stored

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use url::Url;

use crate::config::QueueConfig;
use crate::dispatch::types::AgentRequest;
use crate::transport::{QueuePublisher, TransportError};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

#[derive(Debug, Deserialize)]
struct PublishReply {
    routed: bool,
}

/// Publishes to RabbitMQ via the management HTTP API.
#[derive(Debug)]
pub struct RabbitMqPublisher {
    client: reqwest::Client,
    base_url: Url,
    vhost: String,
    username: String,
    password: String,
    timeout: Duration,
    declared: DashSet<String>,
}

impl RabbitMqPublisher {
    pub fn new(config: &QueueConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(&config.management_url)?,
            vhost: config.vhost.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            timeout: config.timeout(),
            declared: DashSet::new(),
        })
    }

    /// Build `<base>/api/<segments...>`, percent-encoding each segment
    /// (the default vhost `/` becomes `%2F`).
    fn api_url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::Connect {
                endpoint: self.base_url.to_string(),
                reason: "management URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn declare(&self, queue: &str) -> Result<(), TransportError> {
        if self.declared.contains(queue) {
            return Ok(());
        }

        let url = self.api_url(&["queues", &self.vhost, queue])?;
        self.client
            .put(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.timeout)
            .json(&json!({ "durable": true, "auto_delete": false }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e, self.timeout))?;

        tracing::info!(queue = %queue, "Declared durable queue");
        self.declared.insert(queue.to_string());
        Ok(())
    }
}

#[async_trait]
impl QueuePublisher for RabbitMqPublisher {
    async fn publish(&self, queue: &str, request: &AgentRequest) -> Result<(), TransportError> {
        self.declare(queue).await?;

        let payload = serde_json::to_string(request).map_err(|e| TransportError::Broker {
            queue: queue.to_string(),
            reason: format!("could not encode request: {}", e),
        })?;

        let url = self.api_url(&["exchanges", &self.vhost, "amq.default", "publish"])?;
        let reply: PublishReply = self
            .client
            .post(url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .timeout(self.timeout)
            .json(&json!({
                "properties": {
                    "delivery_mode": PERSISTENT,
                    "content_type": "application/json",
                    "message_id": request.id,
                },
                "routing_key": queue,
                "payload": payload,
                "payload_encoding": "string",
            }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e, self.timeout))?
            .json()
            .await
            .map_err(|e| TransportError::from_reqwest(url.as_str(), e, self.timeout))?;

        if !reply.routed {
            // The queue may have been deleted behind our back; declare again next time.
            self.declared.remove(queue);
            return Err(TransportError::Broker {
                queue: queue.to_string(),
                reason: "message was not routed".to_string(),
            });
        }

        tracing::debug!(request_id = %request.id, queue = %queue, "Published persistent message");
        Ok(())
    }
}

/// In-process queue that keeps published requests in memory.
///
/// Nothing consumes these messages except test code, so a queue selected as
/// the runtime backend is bounded: once a queue holds `capacity` messages,
/// further publishes to it fail like a broker that refuses them.
#[derive(Debug)]
pub struct MemoryQueue {
    queues: DashMap<String, Vec<AgentRequest>>,
    available: AtomicBool,
    capacity: usize,
}

impl MemoryQueue {
    /// Messages each queue may hold when built from configuration.
    pub const DEFAULT_CAPACITY: usize = 10_000;

    /// Unbounded queue, for tests.
    pub fn new() -> Self {
        Self::bounded(usize::MAX)
    }

    /// Queue that rejects publishes once a queue holds `capacity` messages.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            queues: DashMap::new(),
            available: AtomicBool::new(true),
            capacity,
        }
    }

    /// Simulate the broker going away (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Messages currently held on `queue`, oldest first.
    pub fn messages(&self, queue: &str) -> Vec<AgentRequest> {
        self.queues
            .get(queue)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self, queue: &str) -> usize {
        self.queues.get(queue).map_or(0, |entry| entry.len())
    }

    /// Remove and return everything on `queue`.
    pub fn drain(&self, queue: &str) -> Vec<AgentRequest> {
        self.queues
            .remove(queue)
            .map(|(_, messages)| messages)
            .unwrap_or_default()
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueuePublisher for MemoryQueue {
    async fn publish(&self, queue: &str, request: &AgentRequest) -> Result<(), TransportError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(TransportError::Broker {
                queue: queue.to_string(),
                reason: "in-memory broker unavailable".to_string(),
            });
        }

        let mut messages = self.queues.entry(queue.to_string()).or_default();
        if messages.len() >= self.capacity {
            return Err(TransportError::Broker {
                queue: queue.to_string(),
                reason: format!("in-memory queue is full ({} messages)", self.capacity),
            });
        }
        messages.push(request.clone());
        Ok(())
    }
}
