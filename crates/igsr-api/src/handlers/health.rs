//! Health check endpoints

use axum::{extract::State, Json};

use crate::{
    models::{HealthResponse, RootResponse},
    state::AppState,
};

/// Liveness, independent of the search engine
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Process is up", body = RootResponse)
    )
)]
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse { ok: true })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status, degraded when the engine is down", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.gateway.ping().await {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
