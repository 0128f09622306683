//! Thin HTTP surface over the pipeline's outputs.
//!
//! Handlers contain no pipeline logic: they read store state or invoke a
//! single scorer / alert-manager operation.

pub mod alerts;
pub mod health;
pub mod locations;
pub mod model;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        health::get_health,
        locations::list_locations,
        locations::get_conditions,
        locations::list_assessments,
        locations::score_location,
        alerts::list_alerts,
        alerts::resolve_alert,
        alerts::dismiss_alert,
        model::get_model,
        model::activate_model,
    ),
    components(
        schemas(
            locations::LocationResponse,
            locations::ConditionsResponse,
            locations::ReadingResponse,
            locations::AssessmentResponse,
            alerts::AlertResponse,
            alerts::ActorRequest,
            model::ModelInfoResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "locations", description = "Monitored locations, conditions, and assessments"),
        (name = "alerts", description = "Alert lifecycle"),
        (name = "model", description = "Risk model selection"),
    ),
    info(
        title = "Coastwatch API",
        description = "Coastal hazard monitoring pipeline",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/locations", get(locations::list_locations))
        .route(
            "/locations/{location_id}/conditions",
            get(locations::get_conditions),
        )
        .route(
            "/locations/{location_id}/assessments",
            get(locations::list_assessments),
        )
        .route(
            "/locations/{location_id}/score",
            post(locations::score_location),
        )
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/{alert_id}/resolve", post(alerts::resolve_alert))
        .route("/alerts/{alert_id}/dismiss", post(alerts::dismiss_alert))
        .route("/model", get(model::get_model))
        .route("/model/{version}/activate", post(model::activate_model))
        .route("/health", get(health::get_health));

    let health_routes = Router::new().route("/healthz", get(health::healthz));

    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
