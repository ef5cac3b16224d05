use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::http::server::AppState;
use crate::resilience::{BreakerSnapshot, CircuitState};

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub service: String,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub breakers: usize,
    pub open_breakers: usize,
}

#[derive(Debug, Serialize)]
pub struct BreakerStatus {
    pub target: String,
    #[serde(flatten)]
    pub snapshot: BreakerSnapshot,
}

#[derive(Debug, Serialize)]
pub struct RoutingTable {
    pub routes: BTreeMap<String, String>,
    pub default_target: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshots = state.dispatcher.breakers().snapshots();
    let open_breakers = snapshots
        .iter()
        .filter(|(_, s)| s.state != CircuitState::Closed)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        service: state.service_name.to_string(),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        breakers: snapshots.len(),
        open_breakers,
    })
}

/// Every breaker created so far, sorted by target.
pub async fn get_breakers(State(state): State<AppState>) -> Json<Vec<BreakerStatus>> {
    let breakers = state
        .dispatcher
        .breakers()
        .snapshots()
        .into_iter()
        .map(|(target, snapshot)| BreakerStatus { target, snapshot })
        .collect();

    Json(breakers)
}

pub async fn get_routes(State(state): State<AppState>) -> Json<RoutingTable> {
    let router = state.dispatcher.router();
    Json(RoutingTable {
        routes: router.routes().clone(),
        default_target: router.default_target().to_string(),
    })
}

/// Force a breaker closed. Unknown targets are a 404; this never creates one.
pub async fn reset_breaker(
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<BreakerStatus>, StatusCode> {
    let breaker = state
        .dispatcher
        .breakers()
        .get(&target)
        .ok_or(StatusCode::NOT_FOUND)?;

    breaker.reset();
    tracing::info!(target_service = %target, "Circuit breaker reset by operator");

    Ok(Json(BreakerStatus {
        snapshot: breaker.snapshot(),
        target,
    }))
}
