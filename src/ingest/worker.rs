//! One ingestion cycle: fetch, normalize, validate, write.
//!
//! Each (location, provider) pair is evaluated independently; a failing
//! pair is retried with bounded exponential backoff, then marked degraded
//! for the cycle and collected into the report instead of aborting the
//! cycle. Writes are idempotent under the reading key, so re-ingesting an
//! already-stored observation is a no-op.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::common::AppState;
use crate::domain::features::REQUIRED_KINDS;
use crate::domain::{Location, MeasurementKind, QualityFlag, Reading};
use crate::provider::{ProviderClient, RawObservation};

#[derive(Clone, Debug, Serialize)]
pub struct PairFailure {
    pub location_id: Uuid,
    pub location: String,
    pub provider: String,
    pub attempts: u32,
    pub error: String,
}

/// Aggregated outcome of one ingestion cycle.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CycleReport {
    pub readings_written: usize,
    pub duplicates: usize,
    pub malformed_skipped: usize,
    pub suspect: usize,
    /// Required kinds with no reading inside the window, across locations.
    pub missing_kinds: usize,
    pub failures: Vec<PairFailure>,
}

#[derive(Default)]
struct PairStats {
    written: usize,
    duplicates: usize,
    malformed: usize,
    suspect: usize,
}

/// Run one ingestion cycle over every active location and configured
/// provider. Pairs run concurrently; failures never abort the cycle.
pub async fn run_ingest_cycle(state: &AppState) -> CycleReport {
    let started = Utc::now();
    let since = started - ChronoDuration::minutes(state.config.ingest_window_minutes);
    let locations = state.store.active_locations();

    let mut tasks = Vec::new();
    for location in &locations {
        for provider in state.providers.iter() {
            let Some(station_id) = location.station_ids.get(provider.source_id()) else {
                continue;
            };
            tasks.push(ingest_pair(state, provider, location, station_id, since));
        }
    }

    let mut report = CycleReport::default();
    for result in join_all(tasks).await {
        match result {
            Ok(stats) => {
                report.readings_written += stats.written;
                report.duplicates += stats.duplicates;
                report.malformed_skipped += stats.malformed;
                report.suspect += stats.suspect;
            }
            Err(failure) => report.failures.push(failure),
        }
    }

    // Required kinds still absent within the window are reported as
    // missing, not stored: the assembler treats them as absent features.
    for location in &locations {
        for kind in REQUIRED_KINDS {
            let fresh = state
                .store
                .latest_reading(location.id, kind, started)
                .is_some_and(|r| r.timestamp >= since);
            if !fresh {
                tracing::debug!(location = %location.name, kind = %kind, "No reading within window");
                report.missing_kinds += 1;
            }
        }
    }

    report
}

/// Fetch and store observations for one (location, provider) pair,
/// retrying transient errors with exponential backoff up to the configured
/// attempt cap.
async fn ingest_pair(
    state: &AppState,
    provider: &ProviderClient,
    location: &Location,
    station_id: &str,
    since: DateTime<Utc>,
) -> Result<PairStats, PairFailure> {
    let max_attempts = state.config.ingest_retry_max.max(1);
    let base_delay = Duration::from_millis(state.config.ingest_retry_base_delay_ms);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match provider.get_observations(station_id, since).await {
            Ok(observations) => {
                return Ok(write_observations(state, location, provider.source_id(), observations));
            }
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = base_delay * 2u32.saturating_pow(attempt - 1);
                tracing::warn!(
                    location = %location.name,
                    provider = provider.source_id(),
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Provider fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    location = %location.name,
                    provider = provider.source_id(),
                    attempt,
                    error = %e,
                    "Provider pair degraded for this cycle"
                );
                return Err(PairFailure {
                    location_id: location.id,
                    location: location.name.clone(),
                    provider: provider.source_id().to_string(),
                    attempts: attempt,
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Normalize, validate, and idempotently store a batch of observations.
fn write_observations(
    state: &AppState,
    location: &Location,
    source: &str,
    observations: Vec<RawObservation>,
) -> PairStats {
    let mut stats = PairStats::default();

    for observation in observations {
        let Some((value, unit)) = normalize_unit(observation.kind, observation.value, &observation.unit)
        else {
            tracing::debug!(
                location = %location.name,
                source,
                kind = %observation.kind,
                unit = %observation.unit,
                "Skipping observation with unknown unit"
            );
            stats.malformed += 1;
            continue;
        };

        let (min, max) = observation.kind.valid_range();
        let quality = if (min..=max).contains(&value) {
            QualityFlag::Ok
        } else {
            stats.suspect += 1;
            QualityFlag::Suspect
        };

        let reading = Reading {
            location_id: location.id,
            kind: observation.kind,
            value,
            unit: unit.to_string(),
            timestamp: observation.timestamp,
            source: source.to_string(),
            quality,
        };

        if state.store.insert_reading(reading) {
            stats.written += 1;
        } else {
            stats.duplicates += 1;
        }
    }

    stats
}

/// Convert a provider unit into the canonical unit for the kind.
/// Returns None for units we cannot safely interpret.
fn normalize_unit(kind: MeasurementKind, value: f64, unit: &str) -> Option<(f64, &'static str)> {
    let canonical = kind.canonical_unit();
    let converted = match unit {
        "m" | "meters" => value,
        "ft" | "feet" => value * 0.3048,
        "m/s" => value,
        "kn" | "knots" => value * 0.514_444,
        "deg" | "degrees" => value,
        "mb" | "hPa" => value,
        "degC" | "C" | "celsius" => value,
        "ppt" => value,
        _ => return None,
    };

    // Unit families must match the kind they claim to measure.
    let family_ok = match kind {
        MeasurementKind::WaterLevel | MeasurementKind::WaveHeight => {
            matches!(unit, "m" | "meters" | "ft" | "feet")
        }
        MeasurementKind::WindSpeed => matches!(unit, "m/s" | "kn" | "knots"),
        MeasurementKind::WindDirection => matches!(unit, "deg" | "degrees"),
        MeasurementKind::AirPressure => matches!(unit, "mb" | "hPa"),
        MeasurementKind::WaterTemperature => matches!(unit, "degC" | "C" | "celsius"),
        MeasurementKind::Salinity => matches!(unit, "ppt"),
    };

    family_ok.then_some((converted, canonical))
}
