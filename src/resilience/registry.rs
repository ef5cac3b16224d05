//! Per-target circuit breaker registry.
//!
//! # Responsibilities
//! - Own exactly one breaker per target name for the process lifetime
//! - Create breakers lazily on first reference
//! - Expose snapshots for the admin API
//!
//! # Design Decisions
//! - DashMap entry lock makes get-or-create exactly-once under races
//! - Breakers are handed out as `Arc` so callers never hold a map lock
//!   while a call is in flight

use dashmap::DashMap;
use std::sync::Arc;

use crate::config::BreakerConfig;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker};

/// Owns one [`CircuitBreaker`] per target name.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    /// Create an empty registry whose breakers all use `config`.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Return the breaker for `target`, creating it if this is the first
    /// reference to that name.
    pub fn get_or_create(&self, target: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(target) {
            return existing.value().clone();
        }

        self.breakers
            .entry(target.to_string())
            .or_insert_with(|| {
                tracing::debug!(target_service = %target, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(target, self.config.clone()))
            })
            .value()
            .clone()
    }

    /// Look up a breaker without creating one.
    pub fn get(&self, target: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(target).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Snapshots of every breaker, sorted by target name.
    pub fn snapshots(&self) -> Vec<(String, BreakerSnapshot)> {
        let mut all: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().snapshot()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}
