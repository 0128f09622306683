//! End-to-end pipeline scenarios: ingest through the synthetic provider,
//! assemble, score, and drive the alert state machine; plus retention
//! cleanup with alert lineage protection.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use coastwatch::alert::AlertOutcome;
use coastwatch::common::AppState;
use coastwatch::config::Config;
use coastwatch::domain::{
    AlertStatus, FeatureVector, HazardKind, Location, MeasurementKind, RiskLevel,
};
use coastwatch::error::AppResult;
use coastwatch::ingest::worker::run_ingest_cycle;
use coastwatch::provider::{ProviderClient, RawObservation, SyntheticProvider};
use coastwatch::scoring::{ModelRegistry, RiskModel};

struct FixedModel {
    version: String,
    schema: Vec<String>,
    score: f64,
}

impl FixedModel {
    fn new(version: &str, score: f64) -> Self {
        Self {
            version: version.to_string(),
            schema: vec!["water_level".to_string(), "wave_height".to_string()],
            score,
        }
    }
}

impl RiskModel for FixedModel {
    fn version(&self) -> &str {
        &self.version
    }

    fn input_schema(&self) -> &[String] {
        &self.schema
    }

    fn score(&self, _features: &FeatureVector) -> AppResult<f64> {
        Ok(self.score)
    }
}

fn observation(kind: MeasurementKind, value: f64, unit: &str) -> RawObservation {
    RawObservation {
        kind,
        value,
        unit: unit.to_string(),
        timestamp: Utc::now() - Duration::minutes(6),
    }
}

/// Storm-tide conditions at the monitored location: elevated water level,
/// moderate waves, fresh winds.
fn storm_observations() -> Vec<RawObservation> {
    vec![
        observation(MeasurementKind::WaterLevel, 6.0, "m"),
        observation(MeasurementKind::WaveHeight, 3.2, "m"),
        observation(MeasurementKind::WindSpeed, 18.0, "m/s"),
    ]
}

fn pipeline_state(score: f64) -> (AppState, Location) {
    let provider = SyntheticProvider::with_observations(
        "buoy",
        HashMap::from([("st-100".to_string(), storm_observations())]),
    );

    let registry = ModelRegistry::new("fixed-v1");
    registry.register(Arc::new(FixedModel::new("fixed-v1", score)));

    let state = AppState::new(
        Config::default(),
        vec![ProviderClient::Synthetic(provider)],
        registry,
    );

    let location = Location {
        id: Uuid::new_v4(),
        name: "Charleston Harbor".to_string(),
        latitude: 32.7767,
        longitude: -79.9311,
        station_ids: HashMap::from([("buoy".to_string(), "st-100".to_string())]),
        description: String::new(),
        is_active: true,
    };
    state.store.upsert_location(location.clone());

    (state, location)
}

#[tokio::test]
async fn high_risk_conditions_raise_a_coastal_flooding_alert() {
    let (state, location) = pipeline_state(0.82);

    let report = run_ingest_cycle(&state).await;
    assert_eq!(report.readings_written, 3);
    assert!(report.failures.is_empty());

    let assessment = state
        .scorer
        .assess(&location, Utc::now())
        .await
        .expect("scores");
    assert_eq!(assessment.level, RiskLevel::Critical);
    assert_eq!(assessment.features.get("water_level"), Some(6.0));

    let AlertOutcome::Created(alert) = state.alerts.evaluate(&assessment).await else {
        panic!("expected alert creation");
    };
    assert_eq!(alert.hazard, HazardKind::CoastalFlooding);
    assert_eq!(alert.status, AlertStatus::Active);
    assert_eq!(alert.assessment_id, assessment.id);
    assert_eq!(alert.location_id, location.id);
}

#[tokio::test]
async fn low_risk_conditions_create_no_alert() {
    let (state, location) = pipeline_state(0.2);

    run_ingest_cycle(&state).await;

    let assessment = state
        .scorer
        .assess(&location, Utc::now())
        .await
        .expect("scores");
    assert_eq!(assessment.level, RiskLevel::Low);

    let outcome = state.alerts.evaluate(&assessment).await;
    assert_eq!(outcome, AlertOutcome::NoAction);
    assert!(state.store.alerts(None).is_empty());
}

#[tokio::test]
async fn cleanup_preserves_the_lineage_of_unresolved_alerts() {
    let (state, location) = pipeline_state(0.82);

    run_ingest_cycle(&state).await;
    let assessment = state
        .scorer
        .assess(&location, Utc::now())
        .await
        .expect("scores");
    assert!(!assessment.features.inputs.is_empty());
    state.alerts.evaluate(&assessment).await;

    let before = state.store.reading_count();

    // Zero retention would delete everything not referenced by an
    // unresolved alert's triggering assessment.
    let stats = state.store.cleanup(
        Utc::now() + Duration::days(1),
        Duration::zero(),
        Duration::days(90),
        Duration::days(30),
    );

    let protected = assessment.features.inputs.len();
    assert_eq!(stats.readings_deleted, before - protected);
    for key in &assessment.features.inputs {
        assert!(state
            .store
            .latest_reading(key.location_id, key.kind, Utc::now())
            .is_some());
    }

    // Resolve the alert; the lineage is no longer protected.
    let alert = state
        .store
        .alerts(Some(AlertStatus::Active))
        .pop()
        .expect("active alert");
    state
        .alerts
        .resolve(alert.id, "duty-officer")
        .await
        .expect("resolves");

    let stats = state.store.cleanup(
        Utc::now() + Duration::days(1),
        Duration::zero(),
        Duration::days(90),
        Duration::days(30),
    );
    assert_eq!(stats.readings_deleted, protected);
    assert_eq!(state.store.reading_count(), 0);
}
