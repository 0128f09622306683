//! Deterministic observation source for development and tests.
//!
//! Serves canned observations per station, with optional per-station
//! failure injection. The demo mode generates calm-weather values for any
//! station so the pipeline can run end-to-end without network access.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::domain::MeasurementKind;
use crate::error::{AppError, AppResult};
use crate::provider::RawObservation;

pub struct SyntheticProvider {
    source: String,
    /// Canned observations per station id. Empty map means demo mode.
    observations: HashMap<String, Vec<RawObservation>>,
    failing: HashSet<String>,
}

impl SyntheticProvider {
    /// Demo mode: calm conditions for any station, timestamped at request
    /// time.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            source: "synthetic".to_string(),
            observations: HashMap::new(),
            failing: HashSet::new(),
        }
    }

    /// Serve exactly the given observations per station.
    #[must_use]
    pub fn with_observations(
        source: &str,
        observations: HashMap<String, Vec<RawObservation>>,
    ) -> Self {
        Self {
            source: source.to_string(),
            observations,
            failing: HashSet::new(),
        }
    }

    /// Make requests for a station fail with `ProviderUnavailable`.
    #[must_use]
    pub fn fail_station(mut self, station_id: &str) -> Self {
        self.failing.insert(station_id.to_string());
        self
    }

    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source
    }

    /// Observations for a station newer than `since`.
    ///
    /// # Errors
    ///
    /// `ProviderUnavailable` for stations configured to fail.
    pub fn get_observations(
        &self,
        station_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<RawObservation>> {
        if self.failing.contains(station_id) {
            return Err(AppError::ProviderUnavailable(format!(
                "synthetic outage for station {station_id}"
            )));
        }

        if self.observations.is_empty() {
            return Ok(demo_observations());
        }

        Ok(self
            .observations
            .get(station_id)
            .map(|obs| {
                obs.iter()
                    .filter(|o| o.timestamp > since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn demo_observations() -> Vec<RawObservation> {
    let now = Utc::now();
    let calm: [(MeasurementKind, f64, &str); 6] = [
        (MeasurementKind::WaterLevel, 1.2, "m"),
        (MeasurementKind::WaveHeight, 0.8, "m"),
        (MeasurementKind::WindSpeed, 4.5, "m/s"),
        (MeasurementKind::WindDirection, 210.0, "degrees"),
        (MeasurementKind::AirPressure, 1014.0, "mb"),
        (MeasurementKind::WaterTemperature, 21.0, "celsius"),
    ];

    calm.into_iter()
        .map(|(kind, value, unit)| RawObservation {
            kind,
            value,
            unit: unit.to_string(),
            timestamp: now,
        })
        .collect()
}
