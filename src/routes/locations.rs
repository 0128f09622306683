use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::AppState;
use crate::domain::{Location, Reading, RiskAssessment};
use crate::error::{AppError, AppResult};

#[derive(Serialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub station_ids: HashMap<String, String>,
    pub description: String,
    pub is_active: bool,
}

impl From<Location> for LocationResponse {
    fn from(location: Location) -> Self {
        Self {
            id: location.id,
            name: location.name,
            latitude: location.latitude,
            longitude: location.longitude,
            station_ids: location.station_ids,
            description: location.description,
            is_active: location.is_active,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReadingResponse {
    pub kind: String,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub quality: String,
}

impl From<Reading> for ReadingResponse {
    fn from(reading: Reading) -> Self {
        Self {
            kind: reading.kind.to_string(),
            value: reading.value,
            unit: reading.unit,
            timestamp: reading.timestamp,
            source: reading.source,
            quality: format!("{:?}", reading.quality).to_lowercase(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ConditionsResponse {
    pub location_id: Uuid,
    pub as_of: DateTime<Utc>,
    pub readings: Vec<ReadingResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct AssessmentResponse {
    pub id: Uuid,
    pub location_id: Uuid,
    pub score: f64,
    pub level: String,
    pub model_version: String,
    pub computed_at: DateTime<Utc>,
    pub features: BTreeMap<String, f64>,
    pub absent_features: Vec<String>,
}

impl From<RiskAssessment> for AssessmentResponse {
    fn from(assessment: RiskAssessment) -> Self {
        Self {
            id: assessment.id,
            location_id: assessment.location_id,
            score: assessment.score,
            level: assessment.level.to_string(),
            model_version: assessment.model_version,
            computed_at: assessment.computed_at,
            features: assessment.features.values,
            absent_features: assessment.features.absent.into_iter().collect(),
        }
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

fn resolve_location(state: &AppState, location_id: Uuid) -> AppResult<Location> {
    state
        .store
        .location(location_id)
        .ok_or_else(|| AppError::NotFound(format!("Location {location_id} not found")))
}

/// List monitored locations
#[utoipa::path(
    get,
    path = "/api/locations",
    responses(
        (status = 200, description = "Locations retrieved successfully", body = Vec<LocationResponse>),
    ),
    tag = "locations"
)]
pub async fn list_locations(State(state): State<AppState>) -> Json<Vec<LocationResponse>> {
    let locations = state
        .store
        .locations()
        .into_iter()
        .map(LocationResponse::from)
        .collect();
    Json(locations)
}

/// Latest reading per measurement kind for a location
#[utoipa::path(
    get,
    path = "/api/locations/{location_id}/conditions",
    params(
        ("location_id" = Uuid, Path, description = "Location id"),
    ),
    responses(
        (status = 200, description = "Current conditions", body = ConditionsResponse),
        (status = 404, description = "Location not found"),
    ),
    tag = "locations"
)]
pub async fn get_conditions(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<ConditionsResponse>> {
    let location = resolve_location(&state, location_id)?;
    let as_of = Utc::now();

    let readings = state
        .store
        .latest_readings(location.id, as_of)
        .into_iter()
        .map(ReadingResponse::from)
        .collect();

    Ok(Json(ConditionsResponse {
        location_id: location.id,
        as_of,
        readings,
    }))
}

/// Assessment history for a location, newest first
#[utoipa::path(
    get,
    path = "/api/locations/{location_id}/assessments",
    params(
        ("location_id" = Uuid, Path, description = "Location id"),
        ("limit" = Option<usize>, Query, description = "Maximum entries to return (default 20)"),
    ),
    responses(
        (status = 200, description = "Assessment history", body = Vec<AssessmentResponse>),
        (status = 404, description = "Location not found"),
    ),
    tag = "locations"
)]
pub async fn list_assessments(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<Vec<AssessmentResponse>>> {
    let location = resolve_location(&state, location_id)?;
    let limit = query.limit.unwrap_or(20);

    let assessments = state
        .store
        .assessments_for(location.id, limit)
        .into_iter()
        .map(AssessmentResponse::from)
        .collect();

    Ok(Json(assessments))
}

/// Trigger on-demand scoring for a location
#[utoipa::path(
    post,
    path = "/api/locations/{location_id}/score",
    params(
        ("location_id" = Uuid, Path, description = "Location id"),
    ),
    responses(
        (status = 200, description = "Assessment computed", body = AssessmentResponse),
        (status = 404, description = "Location not found"),
        (status = 422, description = "Insufficient data to assemble features"),
        (status = 503, description = "Model unavailable or inference failed"),
    ),
    tag = "locations"
)]
pub async fn score_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> AppResult<Json<AssessmentResponse>> {
    let location = resolve_location(&state, location_id)?;

    let assessment = state.scorer.assess(&location, Utc::now()).await?;
    state.alerts.evaluate(&assessment).await;

    Ok(Json(AssessmentResponse::from(assessment)))
}
