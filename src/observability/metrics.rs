//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define dispatch and breaker metrics
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): dispatches by target, transport, outcome
//! - `dispatch_duration_seconds` (histogram): dispatch latency by target, transport
//! - `circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `circuit_breaker_rejections_total` (counter): fail-fast rejections by target

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished dispatch.
pub fn record_dispatch(target: &str, transport: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "dispatch_requests_total",
        "target" => target.to_string(),
        "transport" => transport,
        "outcome" => outcome
    )
    .increment(1);

    metrics::histogram!(
        "dispatch_duration_seconds",
        "target" => target.to_string(),
        "transport" => transport
    )
    .record(start.elapsed().as_secs_f64());
}

/// Publish a breaker's current state.
pub fn record_breaker_state(target: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("circuit_breaker_state", "target" => target.to_string()).set(value);
}

pub fn record_breaker_rejection(target: &str) {
    metrics::counter!("circuit_breaker_rejections_total", "target" => target.to_string()).increment(1);
}
