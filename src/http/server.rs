//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit)
//! - Classify and dispatch `/process` requests
//! - Apply routing table reloads while serving
//! - Stop on the shutdown broadcast

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::admin;
use crate::classifier::{Classifier, KeywordClassifier};
use crate::config::validation::validate_config;
use crate::config::{AdminConfig, ConfigError, GatewayConfig};
use crate::dispatch::{AgentRequest, Dispatcher};
use crate::http::request::{ProcessRequest, X_REQUEST_ID};
use crate::http::response::status_for;
use crate::routing::Router as RoutingTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub classifier: Arc<dyn Classifier>,
    pub service_name: Arc<str>,
    pub admin: AdminConfig,
    pub started_at: Instant,
}

/// HTTP front door of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a server with the transports and classifier named in `config`.
    ///
    /// `config` is validated first, so configs built in code get the same
    /// checks as ones loaded from a file.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let dispatcher = Arc::new(Dispatcher::from_config(&config)?);
        Ok(Self::with_parts(config, dispatcher, Arc::new(KeywordClassifier)))
    }

    /// Create a server around an existing dispatcher and classifier.
    pub fn with_parts(
        config: GatewayConfig,
        dispatcher: Arc<Dispatcher>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let state = AppState {
            dispatcher: dispatcher.clone(),
            classifier,
            service_name: Arc::from(config.service.name.as_str()),
            admin: config.admin.clone(),
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/process", post(process_handler))
            .route("/health", get(health_handler));

        if config.admin.enabled {
            app = app.merge(admin::router(state.clone()));
        }

        app.with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `shutdown` fires, applying routing updates
    /// received on `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let dispatcher = self.dispatcher.clone();
        let startup_breaker = self.config.breaker.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                if new_config.breaker != startup_breaker {
                    tracing::warn!("Breaker settings changed; they apply after a restart");
                }
                dispatcher.reload_routes(RoutingTable::from_config(&new_config.routing));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

/// Classify, dispatch and report one request.
async fn process_handler(
    State(state): State<AppState>,
    Json(payload): Json<ProcessRequest>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    tracing::info!(request_id = %request_id, user_id = ?payload.user_id, "Processing request");

    let analysis = state.classifier.classify(&payload.message, &payload.context).await;
    let request = AgentRequest::new(
        request_id.clone(),
        payload.message,
        payload.user_id,
        payload.context,
        analysis,
    );

    let outcome = state.dispatcher.dispatch(&request).await;
    let status = status_for(&outcome);
    let body = outcome.into_response(&request_id, &state.service_name);

    let mut response = (status, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    response
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": &*state.service_name,
        })),
    )
}
