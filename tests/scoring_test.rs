//! Feature assembly and scoring tests: staleness handling, insufficient
//! data, band discretization, schema validation, and the inference
//! contract.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use coastwatch::config::Config;
use coastwatch::domain::{
    FeatureVector, Location, MeasurementKind, QualityFlag, Reading, RiskBands, RiskLevel,
};
use coastwatch::error::{AppError, AppResult};
use coastwatch::scoring::{FeatureAssembler, ModelRegistry, RiskModel, RiskScorer};
use coastwatch::store::MonitorStore;

struct FixedModel {
    version: String,
    schema: Vec<String>,
    score: f64,
}

impl FixedModel {
    fn new(version: &str, score: f64) -> Self {
        Self {
            version: version.to_string(),
            schema: vec!["water_level".to_string(), "wind_speed".to_string()],
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

fn test_location() -> Location {
    Location {
        id: Uuid::new_v4(),
        name: "Test Point".to_string(),
        latitude: 32.77,
        longitude: -79.93,
        station_ids: Default::default(),
        description: String::new(),
        is_active: true,
    }
}

fn reading(
    location_id: Uuid,
    kind: MeasurementKind,
    value: f64,
    timestamp: DateTime<Utc>,
) -> Reading {
    Reading {
        location_id,
        kind,
        value,
        unit: kind.canonical_unit().to_string(),
        timestamp,
        source: "test".to_string(),
        quality: QualityFlag::Ok,
    }
}

fn seed_all_kinds(store: &MonitorStore, location_id: Uuid, at: DateTime<Utc>) {
    for (kind, value) in [
        (MeasurementKind::WaterLevel, 1.5),
        (MeasurementKind::WaveHeight, 1.0),
        (MeasurementKind::WindSpeed, 6.0),
        (MeasurementKind::WindDirection, 180.0),
        (MeasurementKind::AirPressure, 1012.0),
        (MeasurementKind::WaterTemperature, 20.0),
    ] {
        store.insert_reading(reading(location_id, kind, value, at));
    }
}

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 14, 0, 0).unwrap()
}

#[test]
fn assembly_uses_latest_fresh_readings_and_as_of_temporal_features() {
    let store = MonitorStore::new();
    let location = test_location();
    let now = as_of();

    seed_all_kinds(&store, location.id, now - Duration::hours(2));
    // A newer water level supersedes the older one.
    store.insert_reading(reading(
        location.id,
        MeasurementKind::WaterLevel,
        3.3,
        now - Duration::hours(1),
    ));

    let assembler = FeatureAssembler::new(&Config::default());
    let vector = assembler.assemble(&store, &location, now).expect("assembles");

    assert_eq!(vector.get("water_level"), Some(3.3));
    assert!(vector.absent.is_empty());
    // Temporal features come from as_of, not reading timestamps.
    assert_eq!(vector.get("hour_of_day"), Some(14.0));
    assert_eq!(vector.get("day_of_year"), Some(213.0));
}

#[test]
fn stale_readings_are_marked_absent_with_defaults() {
    let config = Config {
        staleness_window_minutes: 60,
        ..Config::default()
    };
    let store = MonitorStore::new();
    let location = test_location();
    let now = as_of();

    seed_all_kinds(&store, location.id, now - Duration::minutes(30));
    // Water level only has a reading outside the staleness window.
    store.insert_reading(reading(
        location.id,
        MeasurementKind::WaterLevel,
        9.9,
        now - Duration::hours(5),
    ));

    let assembler = FeatureAssembler::new(&config);
    let vector = assembler.assemble(&store, &location, now).expect("assembles");

    // But seed_all_kinds also wrote a fresh water level; remove ambiguity by
    // checking the fresh value won.
    assert_eq!(vector.get("water_level"), Some(1.5));

    let bare_store = MonitorStore::new();
    for (kind, value) in [
        (MeasurementKind::WaveHeight, 1.0),
        (MeasurementKind::WindSpeed, 6.0),
        (MeasurementKind::WindDirection, 180.0),
        (MeasurementKind::AirPressure, 1012.0),
        (MeasurementKind::WaterTemperature, 20.0),
    ] {
        bare_store.insert_reading(reading(location.id, kind, value, now - Duration::minutes(10)));
    }
    bare_store.insert_reading(reading(
        location.id,
        MeasurementKind::WaterLevel,
        9.9,
        now - Duration::hours(5),
    ));

    let vector = assembler
        .assemble(&bare_store, &location, now)
        .expect("assembles");
    assert!(vector.absent.contains("water_level"));
    // Documented default substitutes for the stale reading.
    assert_eq!(vector.get("water_level"), Some(0.0));
}

#[test]
fn too_many_absent_features_fail_with_insufficient_data() {
    let store = MonitorStore::new();
    let location = test_location();
    let now = as_of();

    // Only two of six required kinds present.
    store.insert_reading(reading(
        location.id,
        MeasurementKind::WaterLevel,
        1.0,
        now - Duration::minutes(10),
    ));
    store.insert_reading(reading(
        location.id,
        MeasurementKind::WindSpeed,
        5.0,
        now - Duration::minutes(10),
    ));

    let assembler = FeatureAssembler::new(&Config::default());
    let result = assembler.assemble(&store, &location, now);
    assert!(matches!(result, Err(AppError::InsufficientData(_))));
}

#[test]
fn default_bands_discretize_scores_as_documented() {
    let bands = RiskBands::default();
    assert_eq!(bands.classify(0.1), RiskLevel::Low);
    assert_eq!(bands.classify(0.3), RiskLevel::Medium);
    assert_eq!(bands.classify(0.59), RiskLevel::Medium);
    assert_eq!(bands.classify(0.6), RiskLevel::High);
    assert_eq!(bands.classify(0.75), RiskLevel::High);
    assert_eq!(bands.classify(0.8), RiskLevel::Critical);
    assert_eq!(bands.classify(0.95), RiskLevel::Critical);
}

#[tokio::test]
async fn scorer_records_model_version_and_writes_assessment() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location();
    let now = as_of();
    store.upsert_location(location.clone());
    seed_all_kinds(&store, location.id, now - Duration::minutes(10));

    let registry = Arc::new(ModelRegistry::new("fixed-v2"));
    registry.register(Arc::new(FixedModel::new("fixed-v2", 0.75)));

    let scorer = RiskScorer::new(store.clone(), registry, &Config::default());
    let assessment = scorer.assess(&location, now).await.expect("scores");

    assert!((assessment.score - 0.75).abs() < 1e-12);
    assert_eq!(assessment.level, RiskLevel::High);
    assert_eq!(assessment.model_version, "fixed-v2");

    let stored = store.latest_assessment(location.id).expect("persisted");
    assert_eq!(stored.id, assessment.id);
}

#[tokio::test]
async fn schema_drift_fails_fast_before_inference() {
    struct DriftedModel;
    impl RiskModel for DriftedModel {
        fn version(&self) -> &str {
            "drifted-v1"
        }
        fn input_schema(&self) -> &[String] {
            static SCHEMA: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
            SCHEMA.get_or_init(|| vec!["swell_period".to_string()])
        }
        fn score(&self, _features: &FeatureVector) -> AppResult<f64> {
            panic!("must not be invoked on schema mismatch");
        }
    }

    let store = Arc::new(MonitorStore::new());
    let location = test_location();
    let now = as_of();
    store.upsert_location(location.clone());
    seed_all_kinds(&store, location.id, now - Duration::minutes(10));

    let registry = Arc::new(ModelRegistry::new("drifted-v1"));
    registry.register(Arc::new(DriftedModel));

    let scorer = RiskScorer::new(store, registry, &Config::default());
    let result = scorer.assess(&location, now).await;
    assert!(matches!(result, Err(AppError::SchemaMismatch(_))));
}

#[tokio::test]
async fn out_of_range_model_output_is_an_inference_failure() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location();
    let now = as_of();
    store.upsert_location(location.clone());
    seed_all_kinds(&store, location.id, now - Duration::minutes(10));

    let registry = Arc::new(ModelRegistry::new("broken-v1"));
    registry.register(Arc::new(FixedModel::new("broken-v1", 1.5)));

    let scorer = RiskScorer::new(store.clone(), registry, &Config::default());
    let result = scorer.assess(&location, now).await;
    assert!(matches!(result, Err(AppError::ModelInferenceFailure(_))));
    // The pipeline never invents a score: nothing was written.
    assert!(store.latest_assessment(location.id).is_none());
}

#[tokio::test]
async fn unknown_active_version_is_a_load_failure() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location();
    let now = as_of();
    store.upsert_location(location.clone());
    seed_all_kinds(&store, location.id, now - Duration::minutes(10));

    let registry = Arc::new(ModelRegistry::new("not-registered"));
    let scorer = RiskScorer::new(store, registry, &Config::default());
    let result = scorer.assess(&location, now).await;
    assert!(matches!(result, Err(AppError::ModelLoadFailure(_))));
}
