//! Ingestion cycle tests: idempotent writes, unit normalization, quality
//! flags, and partial-failure isolation between provider pairs.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use coastwatch::common::AppState;
use coastwatch::config::Config;
use coastwatch::domain::{Location, MeasurementKind, QualityFlag};
use coastwatch::ingest::worker::run_ingest_cycle;
use coastwatch::provider::{ProviderClient, RawObservation, SyntheticProvider};
use coastwatch::scoring::ModelRegistry;

fn test_config() -> Config {
    Config {
        ingest_retry_max: 2,
        ingest_retry_base_delay_ms: 1,
        ingest_window_minutes: 60,
        ..Config::default()
    }
}

fn test_location(name: &str, source: &str, station: &str) -> Location {
    Location {
        id: Uuid::new_v4(),
        name: name.to_string(),
        latitude: 25.76,
        longitude: -80.19,
        station_ids: HashMap::from([(source.to_string(), station.to_string())]),
        description: String::new(),
        is_active: true,
    }
}

fn observation(kind: MeasurementKind, value: f64, unit: &str, minutes_ago: i64) -> RawObservation {
    RawObservation {
        kind,
        value,
        unit: unit.to_string(),
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}

#[tokio::test]
async fn reingesting_the_same_observations_is_idempotent() {
    let observations = vec![
        observation(MeasurementKind::WaterLevel, 1.5, "m", 10),
        observation(MeasurementKind::WindSpeed, 7.0, "m/s", 10),
    ];
    let provider = SyntheticProvider::with_observations(
        "buoy",
        HashMap::from([("st-1".to_string(), observations)]),
    );

    let state = AppState::new(
        test_config(),
        vec![ProviderClient::Synthetic(provider)],
        ModelRegistry::new("baseline-v1"),
    );
    state
        .store
        .upsert_location(test_location("Pier", "buoy", "st-1"));

    let first = run_ingest_cycle(&state).await;
    assert_eq!(first.readings_written, 2);
    assert_eq!(first.duplicates, 0);

    let second = run_ingest_cycle(&state).await;
    assert_eq!(second.readings_written, 0);
    assert_eq!(second.duplicates, 2);

    assert_eq!(state.store.reading_count(), 2);
}

#[tokio::test]
async fn units_are_normalized_before_storage() {
    // Gage height arrives in feet and must land in meters.
    let observations = vec![observation(MeasurementKind::WaterLevel, 10.0, "ft", 5)];
    let provider = SyntheticProvider::with_observations(
        "gauge",
        HashMap::from([("st-9".to_string(), observations)]),
    );

    let state = AppState::new(
        test_config(),
        vec![ProviderClient::Synthetic(provider)],
        ModelRegistry::new("baseline-v1"),
    );
    let location = test_location("Inlet", "gauge", "st-9");
    let location_id = location.id;
    state.store.upsert_location(location);

    run_ingest_cycle(&state).await;

    let reading = state
        .store
        .latest_reading(location_id, MeasurementKind::WaterLevel, Utc::now())
        .expect("reading stored");
    assert!((reading.value - 3.048).abs() < 1e-9);
    assert_eq!(reading.unit, "m");
    assert_eq!(reading.quality, QualityFlag::Ok);
}

#[tokio::test]
async fn out_of_range_values_are_flagged_suspect() {
    // 45 m waves parse fine but exceed the plausible range.
    let observations = vec![observation(MeasurementKind::WaveHeight, 45.0, "m", 5)];
    let provider = SyntheticProvider::with_observations(
        "buoy",
        HashMap::from([("st-2".to_string(), observations)]),
    );

    let state = AppState::new(
        test_config(),
        vec![ProviderClient::Synthetic(provider)],
        ModelRegistry::new("baseline-v1"),
    );
    let location = test_location("Reef", "buoy", "st-2");
    let location_id = location.id;
    state.store.upsert_location(location);

    let report = run_ingest_cycle(&state).await;
    assert_eq!(report.suspect, 1);

    let reading = state
        .store
        .latest_reading(location_id, MeasurementKind::WaveHeight, Utc::now())
        .expect("reading stored");
    assert_eq!(reading.quality, QualityFlag::Suspect);
}

#[tokio::test]
async fn deactivated_locations_are_skipped() {
    let observations = vec![observation(MeasurementKind::WaterLevel, 1.5, "m", 10)];
    let provider = SyntheticProvider::with_observations(
        "buoy",
        HashMap::from([("st-3".to_string(), observations)]),
    );

    let state = AppState::new(
        test_config(),
        vec![ProviderClient::Synthetic(provider)],
        ModelRegistry::new("baseline-v1"),
    );
    let location = test_location("Old Pier", "buoy", "st-3");
    let location_id = location.id;
    state.store.upsert_location(location);
    assert!(state.store.set_location_active(location_id, false));

    let report = run_ingest_cycle(&state).await;
    assert_eq!(report.readings_written, 0);
    assert_eq!(state.store.reading_count(), 0);
}

#[tokio::test]
async fn provider_failure_for_one_location_does_not_abort_others() {
    let failing = SyntheticProvider::with_observations(
        "prov-a",
        HashMap::from([(
            "st-1".to_string(),
            vec![observation(MeasurementKind::WaterLevel, 1.0, "m", 5)],
        )]),
    )
    .fail_station("st-1");

    let healthy = SyntheticProvider::with_observations(
        "prov-b",
        HashMap::from([(
            "st-2".to_string(),
            vec![observation(MeasurementKind::WaterLevel, 2.0, "m", 5)],
        )]),
    );

    let state = AppState::new(
        test_config(),
        vec![
            ProviderClient::Synthetic(failing),
            ProviderClient::Synthetic(healthy),
        ],
        ModelRegistry::new("baseline-v1"),
    );
    let loc_one = test_location("North Jetty", "prov-a", "st-1");
    let loc_two = test_location("South Jetty", "prov-b", "st-2");
    let loc_two_id = loc_two.id;
    state.store.upsert_location(loc_one);
    state.store.upsert_location(loc_two);

    let report = run_ingest_cycle(&state).await;

    // Location 2's reading landed despite provider A's outage.
    assert_eq!(report.readings_written, 1);
    assert!(state
        .store
        .latest_reading(loc_two_id, MeasurementKind::WaterLevel, Utc::now())
        .is_some());

    // The failed pair was retried to the cap, then degraded.
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.provider, "prov-a");
    assert_eq!(failure.attempts, 2);
}
