//! Liveness probes. Both routes are public.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use chat_realtime::metrics::MetricsSnapshot;

use crate::dto::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub connections: usize,
    pub online_users: usize,
}

/// Adds store reachability and relay counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    /// `ok`, or `degraded` while the store is unreachable.
    pub status: &'static str,
    pub database: &'static str,
    pub provider: &'static str,
    pub connections: usize,
    pub online_users: usize,
    pub relay: MetricsSnapshot,
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let registry = &state.realtime.registry;
    Json(ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        connections: registry.connection_count(),
        online_users: registry.user_count(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let reachable = matches!(state.stores.health_check().await, Ok(true));
    let registry = &state.realtime.registry;

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        database: if reachable { "connected" } else { "unavailable" },
        provider: state.stores.provider().as_str(),
        connections: registry.connection_count(),
        online_users: registry.user_count(),
        relay: state.realtime.metrics.snapshot(),
    }))
}
