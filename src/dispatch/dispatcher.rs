//! End-to-end dispatch of one classified request.
//!
//! # Responsibilities
//! - Resolve the target from the classification
//! - Pick the transport from the urgency flag
//! - Run the transport through the target's circuit breaker
//! - Normalize the result into a `DispatchOutcome`
//!
//! # Design Decisions
//! - No retries here; a caller that retries makes a brand-new attempt,
//!   so an open breaker keeps failing fast until its timeout elapses
//! - Synchronous calls carry their own deadline, separate from the
//!   breaker's open timeout
//! - The routing table can be swapped at runtime; breakers are untouched

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ConfigError, GatewayConfig, QueueBackend, ValidationError};
use crate::dispatch::error::DispatchError;
use crate::dispatch::types::{AgentRequest, DispatchOutcome, DispatchPayload};
use crate::observability::metrics;
use crate::resilience::{CircuitBreaker, CircuitBreakerRegistry};
use crate::resilience::timeouts::with_deadline;
use crate::routing::Router;
use crate::transport::{
    queue_name, HttpTransport, MemoryQueue, QueuePublisher, RabbitMqPublisher, SyncTransport,
    Transport,
};

/// Routes, protects and delivers requests to worker services.
pub struct Dispatcher {
    router: ArcSwap<Router>,
    breakers: Arc<CircuitBreakerRegistry>,
    sync_transport: Arc<dyn SyncTransport>,
    queue: Arc<dyn QueuePublisher>,
    sync_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        router: Router,
        breakers: Arc<CircuitBreakerRegistry>,
        sync_transport: Arc<dyn SyncTransport>,
        queue: Arc<dyn QueuePublisher>,
        sync_timeout: Duration,
    ) -> Self {
        Self {
            router: ArcSwap::from_pointee(router),
            breakers,
            sync_transport,
            queue,
            sync_timeout,
        }
    }

    /// Build a dispatcher with the transports named in `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let queue: Arc<dyn QueuePublisher> = match config.transport.queue.backend {
            QueueBackend::Rabbitmq => Arc::new(RabbitMqPublisher::new(&config.transport.queue).map_err(|_| {
                ConfigError::Validation(vec![ValidationError::InvalidUrl {
                    field: "transport.queue.management_url".to_string(),
                    value: config.transport.queue.management_url.clone(),
                }])
            })?),
            QueueBackend::Memory => Arc::new(MemoryQueue::bounded(MemoryQueue::DEFAULT_CAPACITY)),
        };

        Ok(Self::new(
            Router::from_config(&config.routing),
            Arc::new(CircuitBreakerRegistry::new(config.breaker.clone())),
            Arc::new(HttpTransport::new(&config.transport.http)),
            queue,
            config.transport.http.timeout(),
        ))
    }

    /// Deliver `request` and report what happened. Never retries.
    pub async fn dispatch(&self, request: &AgentRequest) -> DispatchOutcome {
        let start = Instant::now();
        let target = self.router.load().resolve(&request.analysis).to_string();
        let breaker = self.breakers.get_or_create(&target);
        let transport = Transport::for_analysis(&request.analysis);

        let result = match transport {
            Transport::Sync => self.send_sync(&breaker, &target, request).await,
            Transport::Queued => self.enqueue(&breaker, &target, request).await,
        };

        let outcome = match result {
            Ok(payload) => DispatchOutcome::Success(payload),
            Err(err) => DispatchOutcome::Failure(err.into()),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &outcome {
            DispatchOutcome::Success(_) => tracing::info!(
                request_id = %request.id,
                target_service = %target,
                transport = transport.as_str(),
                outcome = outcome.label(),
                elapsed_ms,
                "Dispatch succeeded"
            ),
            DispatchOutcome::Failure(failure) => tracing::warn!(
                request_id = %request.id,
                target_service = %target,
                transport = transport.as_str(),
                outcome = outcome.label(),
                error = %failure.message,
                elapsed_ms,
                "Dispatch failed"
            ),
        }
        metrics::record_dispatch(&target, transport.as_str(), outcome.label(), start);

        outcome
    }

    async fn send_sync(
        &self,
        breaker: &CircuitBreaker,
        target: &str,
        request: &AgentRequest,
    ) -> Result<DispatchPayload, DispatchError> {
        breaker
            .call(|| with_deadline(self.sync_timeout, self.sync_transport.send(target, request)))
            .await
            .map(DispatchPayload::Completed)
            .map_err(|e| DispatchError::from_sync(target, e))
    }

    async fn enqueue(
        &self,
        breaker: &CircuitBreaker,
        target: &str,
        request: &AgentRequest,
    ) -> Result<DispatchPayload, DispatchError> {
        let queue = queue_name(target);
        breaker
            .call(|| self.queue.publish(&queue, request))
            .await
            .map_err(|e| DispatchError::from_enqueue(target, e))?;

        Ok(DispatchPayload::Queued { queue })
    }

    /// Replace the routing table. In-flight dispatches keep the table they
    /// started with.
    pub fn reload_routes(&self, router: Router) {
        tracing::info!(
            routes = router.routes().len(),
            default_target = %router.default_target(),
            "Routing table reloaded"
        );
        self.router.store(Arc::new(router));
    }

    /// Current routing table.
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }
}
