//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the routing table points at non-empty targets
//! - Validate value ranges (thresholds >= 1, timeouts > 0)
//! - Check outbound URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, QueueBackend, TARGET_PLACEHOLDER};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be at least 1")]
    ZeroThreshold { field: &'static str },

    #[error("{field} must be greater than 0 seconds")]
    ZeroTimeout { field: &'static str },

    #[error("routing.default_target must not be empty")]
    EmptyDefaultTarget,

    #[error("route for intent '{intent}' has an empty target")]
    EmptyRouteTarget { intent: String },

    #[error("transport.http.url_template must contain {placeholder}")]
    MissingPlaceholder { placeholder: &'static str },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: String, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs ({request_secs}) must be greater than the transport timeouts ({transport_secs})")]
    RequestDeadlineTooShort { request_secs: u64, transport_secs: u64 },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold { field: "breaker.failure_threshold" });
    }
    if config.breaker.recovery_threshold == 0 {
        errors.push(ValidationError::ZeroThreshold { field: "breaker.recovery_threshold" });
    }
    if config.breaker.open_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "breaker.open_timeout_secs" });
    }
    if config.transport.http.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "transport.http.timeout_secs" });
    }
    if config.transport.queue.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "transport.queue.timeout_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout { field: "timeouts.request_secs" });
    }

    // The inbound deadline must outlive every outbound one.
    let transport_secs = config
        .transport
        .http
        .timeout_secs
        .max(config.transport.queue.timeout_secs);
    if config.timeouts.request_secs != 0 && config.timeouts.request_secs <= transport_secs {
        errors.push(ValidationError::RequestDeadlineTooShort {
            request_secs: config.timeouts.request_secs,
            transport_secs,
        });
    }

    if config.routing.default_target.trim().is_empty() {
        errors.push(ValidationError::EmptyDefaultTarget);
    }
    for (intent, target) in &config.routing.routes {
        if target.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteTarget { intent: intent.clone() });
        }
    }

    let template = &config.transport.http.url_template;
    if !template.contains(TARGET_PLACEHOLDER) {
        errors.push(ValidationError::MissingPlaceholder { placeholder: TARGET_PLACEHOLDER });
    } else if Url::parse(&template.replace(TARGET_PLACEHOLDER, "target")).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "transport.http.url_template".to_string(),
            value: template.clone(),
        });
    }
    for (target, endpoint) in &config.transport.http.endpoints {
        if Url::parse(endpoint).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field: format!("transport.http.endpoints.{}", target),
                value: endpoint.clone(),
            });
        }
    }

    if config.transport.queue.backend == QueueBackend::Rabbitmq
        && Url::parse(&config.transport.queue.management_url).is_err()
    {
        errors.push(ValidationError::InvalidUrl {
            field: "transport.queue.management_url".to_string(),
            value: config.transport.queue.management_url.clone(),
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
