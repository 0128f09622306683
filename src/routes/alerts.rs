use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::AppState;
use crate::domain::{Alert, AlertStatus};
use crate::error::{AppError, AppResult};

#[derive(Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: Uuid,
    pub location_id: Uuid,
    pub hazard: String,
    pub severity: String,
    pub status: String,
    pub title: String,
    pub message: String,
    pub assessment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl From<Alert> for AlertResponse {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id,
            location_id: alert.location_id,
            hazard: alert.hazard.to_string(),
            severity: alert.severity.to_string(),
            status: format!("{:?}", alert.status).to_lowercase(),
            title: alert.title,
            message: alert.message,
            assessment_id: alert.assessment_id,
            created_at: alert.created_at,
            updated_at: alert.updated_at,
            resolved_at: alert.resolved_at,
            resolved_by: alert.resolved_by,
        }
    }
}

#[derive(Deserialize)]
pub struct AlertsQuery {
    pub status: Option<String>,
}

/// Actor performing an explicit resolve/dismiss command.
#[derive(Deserialize, ToSchema)]
pub struct ActorRequest {
    pub actor: String,
}

/// List alerts, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/alerts",
    params(
        ("status" = Option<String>, Query, description = "active | resolved | dismissed"),
    ),
    responses(
        (status = 200, description = "Alerts retrieved successfully", body = Vec<AlertResponse>),
        (status = 400, description = "Unknown status filter"),
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> AppResult<Json<Vec<AlertResponse>>> {
    let status = match query.status.as_deref() {
        None => None,
        Some("active") => Some(AlertStatus::Active),
        Some("resolved") => Some(AlertStatus::Resolved),
        Some("dismissed") => Some(AlertStatus::Dismissed),
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown alert status '{other}'"
            )))
        }
    };

    let alerts = state
        .store
        .alerts(status)
        .into_iter()
        .map(AlertResponse::from)
        .collect();

    Ok(Json(alerts))
}

/// Resolve an active alert
#[utoipa::path(
    post,
    path = "/api/alerts/{alert_id}/resolve",
    params(
        ("alert_id" = Uuid, Path, description = "Alert id"),
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Alert resolved (idempotent)", body = AlertResponse),
        (status = 400, description = "Alert is dismissed and cannot be resolved"),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> AppResult<Json<AlertResponse>> {
    let alert = state.alerts.resolve(alert_id, &request.actor).await?;
    Ok(Json(AlertResponse::from(alert)))
}

/// Dismiss an active alert
#[utoipa::path(
    post,
    path = "/api/alerts/{alert_id}/dismiss",
    params(
        ("alert_id" = Uuid, Path, description = "Alert id"),
    ),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Alert dismissed (idempotent)", body = AlertResponse),
        (status = 400, description = "Alert is resolved and cannot be dismissed"),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn dismiss_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(request): Json<ActorRequest>,
) -> AppResult<Json<AlertResponse>> {
    let alert = state.alerts.dismiss(alert_id, &request.actor).await?;
    Ok(Json(AlertResponse::from(alert)))
}
