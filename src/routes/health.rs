use axum::{extract::State, http::StatusCode, Json};

use crate::common::{AppState, PipelineHealth};

/// Health check endpoint
///
/// Returns 200 OK if the service is running. Suitable for liveness probes.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Pipeline health report: last successful cycle per stage, degraded
/// provider pairs, and last-cycle failures.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Pipeline health report", body = PipelineHealth),
    ),
    tag = "health"
)]
pub async fn get_health(State(state): State<AppState>) -> Json<PipelineHealth> {
    let health = state.health.read().expect("health lock poisoned");
    Json(health.clone())
}
