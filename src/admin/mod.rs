//! Operator API: read-only views of sources, cache, connections and cadences.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/sources", get(get_sources))
        .route("/admin/cache", get(get_cache))
        .route("/admin/connections", get(get_connections))
        .route("/admin/cadences", get(get_cadences))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
