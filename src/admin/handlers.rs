use axum::{extract::State, Json};
use serde::Serialize;

use crate::cache::CacheSummary;
use crate::http::server::AppState;
use crate::sync::CadenceSnapshot;
use crate::upstream::SourceSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub connections: usize,
    pub cache_entries: usize,
}

#[derive(Serialize)]
pub struct ConnectionSummary {
    pub connections: usize,
    pub subscriptions: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        connections: state.connections.count(),
        cache_entries: state.cache.len(),
    })
}

pub async fn get_sources(State(state): State<AppState>) -> Json<Vec<SourceSnapshot>> {
    Json(state.coordinator.snapshots())
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheSummary> {
    Json(state.cache.summary())
}

pub async fn get_connections(State(state): State<AppState>) -> Json<ConnectionSummary> {
    let registry = state.connections.registry();
    Json(ConnectionSummary {
        connections: state.connections.count(),
        subscriptions: registry.subscription_count(),
    })
}

pub async fn get_cadences(State(state): State<AppState>) -> Json<Vec<CadenceSnapshot>> {
    Json(state.scheduler.snapshot())
}
