use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::reading::{MeasurementKind, ReadingKey};

/// Fixed feature schema fed to risk models: six measurement features plus
/// two temporal features derived from the assembly timestamp.
pub const FEATURE_SCHEMA: [&str; 8] = [
    "water_level",
    "wave_height",
    "wind_speed",
    "wind_direction",
    "air_pressure",
    "water_temperature",
    "hour_of_day",
    "day_of_year",
];

/// Measurement kinds a feature vector is assembled from.
pub const REQUIRED_KINDS: [MeasurementKind; 6] = [
    MeasurementKind::WaterLevel,
    MeasurementKind::WaveHeight,
    MeasurementKind::WindSpeed,
    MeasurementKind::WindDirection,
    MeasurementKind::AirPressure,
    MeasurementKind::WaterTemperature,
];

/// Substitute value used when a required measurement has no fresh reading.
/// The feature is still recorded in the absent set.
#[must_use]
pub fn default_value(kind: MeasurementKind) -> f64 {
    match kind {
        MeasurementKind::WaterLevel => 0.0,
        MeasurementKind::WaveHeight => 1.0,
        MeasurementKind::WindSpeed => 5.0,
        MeasurementKind::WindDirection => 180.0,
        MeasurementKind::AirPressure => 1013.25,
        MeasurementKind::WaterTemperature => 15.0,
        MeasurementKind::Salinity => 35.0,
    }
}

/// Fixed-schema numeric snapshot fed to a risk model. Ephemeral: constructed
/// on demand and retained only inside the assessment that consumed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub location_id: Uuid,
    pub as_of: DateTime<Utc>,
    pub values: BTreeMap<String, f64>,
    /// Features filled with their documented default instead of a reading.
    pub absent: BTreeSet<String>,
    /// Keys of the readings consumed, for assessment lineage tracking.
    pub inputs: Vec<ReadingKey>,
}

impl FeatureVector {
    /// New vector with the temporal features derived from `as_of`.
    #[must_use]
    pub fn new(location_id: Uuid, as_of: DateTime<Utc>) -> Self {
        let mut values = BTreeMap::new();
        values.insert("hour_of_day".to_string(), f64::from(as_of.hour()));
        values.insert("day_of_year".to_string(), f64::from(as_of.ordinal()));

        Self {
            location_id,
            as_of,
            values,
            absent: BTreeSet::new(),
            inputs: Vec::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Record a feature as absent and fill in its default.
    pub fn set_absent(&mut self, kind: MeasurementKind) {
        self.values
            .insert(kind.as_str().to_string(), default_value(kind));
        self.absent.insert(kind.as_str().to_string());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}
