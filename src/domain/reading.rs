use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Measurement vocabulary shared by all providers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    WaterLevel,
    WaveHeight,
    WindSpeed,
    WindDirection,
    AirPressure,
    WaterTemperature,
    Salinity,
}

impl MeasurementKind {
    pub const ALL: [Self; 7] = [
        Self::WaterLevel,
        Self::WaveHeight,
        Self::WindSpeed,
        Self::WindDirection,
        Self::AirPressure,
        Self::WaterTemperature,
        Self::Salinity,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaterLevel => "water_level",
            Self::WaveHeight => "wave_height",
            Self::WindSpeed => "wind_speed",
            Self::WindDirection => "wind_direction",
            Self::AirPressure => "air_pressure",
            Self::WaterTemperature => "water_temperature",
            Self::Salinity => "salinity",
        }
    }

    /// Canonical unit all readings are normalized into before storage.
    #[must_use]
    pub fn canonical_unit(self) -> &'static str {
        match self {
            Self::WaterLevel | Self::WaveHeight => "m",
            Self::WindSpeed => "m/s",
            Self::WindDirection => "degrees",
            Self::AirPressure => "hPa",
            Self::WaterTemperature => "celsius",
            Self::Salinity => "ppt",
        }
    }

    /// Physically plausible range in the canonical unit. Parseable values
    /// outside the range are stored with the `suspect` quality flag.
    #[must_use]
    pub fn valid_range(self) -> (f64, f64) {
        match self {
            Self::WaterLevel => (-10.0, 20.0),
            Self::WaveHeight => (0.0, 30.0),
            Self::WindSpeed => (0.0, 100.0),
            Self::WindDirection => (0.0, 360.0),
            Self::AirPressure => (900.0, 1100.0),
            Self::WaterTemperature => (-5.0, 40.0),
            Self::Salinity => (0.0, 40.0),
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    Ok,
    Suspect,
    Missing,
}

/// Idempotency key for a stored reading. Re-ingesting a key that already
/// exists is a no-op.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadingKey {
    pub location_id: Uuid,
    pub kind: MeasurementKind,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// One timestamped measurement for a location. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub location_id: Uuid,
    pub kind: MeasurementKind,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub quality: QualityFlag,
}

impl Reading {
    #[must_use]
    pub fn key(&self) -> ReadingKey {
        ReadingKey {
            location_id: self.location_id,
            kind: self.kind,
            timestamp: self.timestamp,
            source: self.source.clone(),
        }
    }
}
