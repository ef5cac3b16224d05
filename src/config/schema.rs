//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Placeholder substituted with the target name in HTTP endpoint templates.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Root configuration for the dispatch gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Service identity reported by `/health` and in responses.
    pub service: ServiceConfig,

    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Intent → target routing table.
    pub routing: RoutingConfig,

    /// Circuit breaker settings applied to every target.
    pub breaker: BreakerConfig,

    /// Outbound transports (sync HTTP, async queue).
    pub transport: TransportConfig,

    /// Timeout configuration for inbound requests.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name used as `agent_id` in responses.
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "root-agent".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Routing table mapping classified intents to target services.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Target used when the intent is missing or unknown.
    pub default_target: String,

    /// Intent label → target name.
    pub routes: BTreeMap<String, String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        let routes = [
            ("payment", "payment-agent-service"),
            ("search", "search-agent-service"),
            ("general", "general-agent-service"),
        ]
        .into_iter()
        .map(|(intent, target)| (intent.to_string(), target.to_string()))
        .collect();

        Self {
            routes,
            default_target: "general-agent-service".to_string(),
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Failures needed to open the circuit.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before a trial call is allowed.
    pub open_timeout_secs: u64,

    /// Consecutive half-open successes needed to close the circuit.
    pub recovery_threshold: u32,
}

impl BreakerConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_secs)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_secs: 60,
            recovery_threshold: 3,
        }
    }
}

/// Outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// Synchronous request/response transport.
    pub http: HttpTransportConfig,

    /// Asynchronous durable transport.
    pub queue: QueueConfig,
}

/// Synchronous HTTP transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Endpoint template; `{target}` is replaced with the target name.
    pub url_template: String,

    /// Per-call deadline in seconds.
    pub timeout_secs: u64,

    /// Explicit endpoints that override the template for specific targets.
    pub endpoints: BTreeMap<String, String>,
}

impl HttpTransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            url_template: format!("http://{}:8000/process", TARGET_PLACEHOLDER),
            endpoints: BTreeMap::new(),
            timeout_secs: 30,
        }
    }
}

/// Which queue publisher backs the asynchronous transport.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// RabbitMQ via its management HTTP API.
    Rabbitmq,
    /// In-process queue (local runs and tests).
    Memory,
}

/// Asynchronous durable transport settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    pub backend: QueueBackend,

    /// Base URL of the RabbitMQ management API.
    pub management_url: String,

    /// Virtual host the queues live in.
    pub vhost: String,

    pub username: String,
    pub password: String,

    /// Deadline for declare + publish, in seconds.
    pub timeout_secs: u64,
}

impl QueueConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::Rabbitmq,
            management_url: "http://rabbitmq-service:15672".to_string(),
            vhost: "/".to_string(),
            username: "guest".to_string(),
            password: "guest".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one `/process` request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable `/admin/*` endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
