//! Synchronous HTTP transport.
//!
//! # Responsibilities
//! - Resolve a target name to its worker endpoint
//! - POST the request JSON and return the worker's JSON object reply
//! - Map connection errors, non-2xx statuses and bad bodies to `TransportError`
//!
//! # Design Decisions
//! - One pooled reqwest client shared by all targets
//! - Explicit per-target endpoints override the URL template
//! - The deadline is enforced here and again by the dispatcher, so the
//!   transport is safe to use on its own

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::schema::{HttpTransportConfig, TARGET_PLACEHOLDER};
use crate::dispatch::types::{AgentRequest, JsonMap};
use crate::transport::{SyncTransport, TransportError};

/// Sends requests to workers over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url_template: String,
    endpoints: BTreeMap<String, String>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &HttpTransportConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &HttpTransportConfig) -> Self {
        Self {
            client,
            url_template: config.url_template.clone(),
            endpoints: config.endpoints.clone(),
            timeout: config.timeout(),
        }
    }

    /// Endpoint the request for `target` is sent to.
    pub fn endpoint_for(&self, target: &str) -> String {
        match self.endpoints.get(target) {
            Some(endpoint) => endpoint.clone(),
            None => self.url_template.replace(TARGET_PLACEHOLDER, target),
        }
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn send(&self, target: &str, request: &AgentRequest) -> Result<JsonMap, TransportError> {
        let endpoint = self.endpoint_for(target);

        tracing::debug!(
            request_id = %request.id,
            target_service = %target,
            endpoint = %endpoint,
            "Sending synchronous request"
        );

        let response = self
            .client
            .post(&endpoint)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| TransportError::from_reqwest(&endpoint, e, self.timeout))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| TransportError::from_reqwest(&endpoint, e, self.timeout))?;

        match body {
            Value::Object(map) => Ok(map),
            other => Err(TransportError::Decode {
                endpoint,
                reason: format!("expected a JSON object, got {}", other),
            }),
        }
    }
}
