//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Classified request (analysis.intent)
//!     → router.rs (table lookup)
//!     → Return: target name (mapped or default)
//!
//! Table compilation (at startup and on config reload):
//!     RoutingConfig
//!     → Router (immutable)
//!     → swapped into the dispatcher as a whole
//! ```
//!
//! # Design Decisions
//! - Tables are immutable; a reload builds a new one
//! - Deterministic: same intent always maps to the same target
//! - Intent labels match exactly (case-sensitive)

pub mod router;

pub use router::Router;
