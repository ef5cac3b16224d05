//! Operator API under `/admin`.
//!
//! Mounted only when `admin.enabled` is set. Every route sits behind the
//! bearer-token check in `auth.rs`.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

/// Admin routes, still waiting for their state.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breakers", get(get_breakers))
        .route("/admin/breakers/{target}/reset", post(reset_breaker))
        .route("/admin/routes", get(get_routes))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
