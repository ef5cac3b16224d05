//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging with the request ID and target on every dispatch line
//! - Metrics are cheap (atomic increments); recording without an installed
//!   exporter is a no-op, so tests need no setup

pub mod logging;
pub mod metrics;
