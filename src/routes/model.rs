use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::error::AppResult;

#[derive(Serialize, ToSchema)]
pub struct ModelInfoResponse {
    pub active_version: String,
    pub versions: Vec<String>,
}

fn model_info(state: &AppState) -> ModelInfoResponse {
    ModelInfoResponse {
        active_version: state.models.active_version(),
        versions: state.models.versions(),
    }
}

/// Currently active risk model and registered versions
#[utoipa::path(
    get,
    path = "/api/model",
    responses(
        (status = 200, description = "Model info", body = ModelInfoResponse),
    ),
    tag = "model"
)]
pub async fn get_model(State(state): State<AppState>) -> Json<ModelInfoResponse> {
    Json(model_info(&state))
}

/// Hot-swap the active risk model by version identifier
#[utoipa::path(
    post,
    path = "/api/model/{version}/activate",
    params(
        ("version" = String, Path, description = "Registered model version"),
    ),
    responses(
        (status = 200, description = "Model activated", body = ModelInfoResponse),
        (status = 503, description = "Unknown model version"),
    ),
    tag = "model"
)]
pub async fn activate_model(
    State(state): State<AppState>,
    Path(version): Path<String>,
) -> AppResult<Json<ModelInfoResponse>> {
    state.models.activate(&version)?;
    Ok(Json(model_info(&state)))
}
