//! Circuit breaker for target protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: target assumed down, calls fail fast
//! - Half-Open: testing if target recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: next call attempt after open_timeout has elapsed
//! Half-Open → Closed: success_count >= recovery_threshold
//! Half-Open → Open: any trial call fails
//! ```
//!
//! # Design Decisions
//! - Per-target circuit breaker (not global)
//! - Fail fast in Open state; rejected calls are not failures
//! - A success while Closed leaves failure_count untouched; only recovery
//!   or an explicit reset clears it
//! - The lock is never held across the protected call

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without invoking it.
    #[error("circuit breaker is open")]
    Open,
    /// The protected call ran and failed.
    #[error(transparent)]
    Inner(E),
}

/// Point-in-time view of a breaker, for the admin API and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub rejected_count: u64,
    pub secs_since_last_failure: Option<u64>,
}

#[derive(Debug)]
struct Counters {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    rejected_count: u64,
    last_failure: Option<Instant>,
}

/// Fault-detection state machine guarding a single target.
#[derive(Debug)]
pub struct CircuitBreaker {
    target: String,
    config: BreakerConfig,
    counters: Mutex<Counters>,
}

impl CircuitBreaker {
    /// Create a closed breaker for `target`.
    pub fn new(target: impl Into<String>, config: BreakerConfig) -> Self {
        Self {
            target: target.into(),
            config,
            counters: Mutex::new(Counters {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                rejected_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let counters = self.lock();
        BreakerSnapshot {
            state: counters.state,
            failure_count: counters.failure_count,
            success_count: counters.success_count,
            rejected_count: counters.rejected_count,
            secs_since_last_failure: counters.last_failure.map(|t| t.elapsed().as_secs()),
        }
    }

    /// Run `op` under breaker protection.
    ///
    /// Returns [`BreakerError::Open`] without invoking `op` while the circuit
    /// is open. Otherwise `op` runs, its outcome is recorded, and its result
    /// or error is handed back unchanged.
    pub async fn call<F, Fut, T, E>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.admit() {
            return Err(BreakerError::Open);
        }

        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(BreakerError::Inner(e))
            }
        }
    }

    /// Force the breaker closed and clear its counters.
    pub fn reset(&self) {
        let mut counters = self.lock();
        counters.failure_count = 0;
        counters.success_count = 0;
        counters.last_failure = None;
        self.transition(&mut counters, CircuitState::Closed);
    }

    fn admit(&self) -> bool {
        let mut counters = self.lock();
        if counters.state != CircuitState::Open {
            return true;
        }

        let elapsed = counters
            .last_failure
            .map_or(true, |at| at.elapsed() >= self.config.open_timeout());
        if elapsed {
            self.transition(&mut counters, CircuitState::HalfOpen);
            return true;
        }

        counters.rejected_count += 1;
        metrics::record_breaker_rejection(&self.target);
        tracing::debug!(target_service = %self.target, "Circuit open, rejecting call");
        false
    }

    fn record_success(&self) {
        let mut counters = self.lock();
        if counters.state != CircuitState::HalfOpen {
            return;
        }

        counters.success_count += 1;
        if counters.success_count >= self.config.recovery_threshold {
            counters.failure_count = 0;
            counters.success_count = 0;
            self.transition(&mut counters, CircuitState::Closed);
        }
    }

    fn record_failure(&self) {
        let mut counters = self.lock();
        counters.failure_count = counters.failure_count.saturating_add(1);
        counters.last_failure = Some(Instant::now());

        match counters.state {
            CircuitState::Closed => {
                if counters.failure_count >= self.config.failure_threshold {
                    self.transition(&mut counters, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                counters.success_count = 0;
                self.transition(&mut counters, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn transition(&self, counters: &mut Counters, to: CircuitState) {
        let from = counters.state;
        if from == to {
            return;
        }
        counters.state = to;

        match to {
            CircuitState::Open => tracing::warn!(
                target_service = %self.target,
                failures = counters.failure_count,
                from = %from,
                "Circuit breaker opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                target_service = %self.target,
                "Circuit breaker half-open, probing target"
            ),
            CircuitState::Closed => tracing::info!(
                target_service = %self.target,
                from = %from,
                "Circuit breaker closed"
            ),
        }
        metrics::record_breaker_state(&self.target, to);
    }

    fn lock(&self) -> MutexGuard<'_, Counters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
