use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::domain::features::REQUIRED_KINDS;
use crate::domain::{FeatureVector, Location, QualityFlag};
use crate::error::{AppError, AppResult};
use crate::store::MonitorStore;

/// Builds fixed-schema feature vectors from the latest stored readings.
///
/// Operates purely against the store and never blocks on ingestion, so
/// scoring cadence is decoupled from ingestion cadence.
pub struct FeatureAssembler {
    staleness_window: Duration,
    max_absent_fraction: f64,
}

impl FeatureAssembler {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            staleness_window: Duration::minutes(config.staleness_window_minutes),
            max_absent_fraction: config.max_absent_fraction,
        }
    }

    /// Assemble the feature vector for a location as of the given instant.
    ///
    /// Per required kind, the latest reading at or before `as_of` within
    /// the staleness window; anything older (or missing entirely) is marked
    /// absent and filled with its documented default. Temporal features
    /// derive from `as_of`, not from reading timestamps.
    ///
    /// # Errors
    ///
    /// `InsufficientData` when more than the configured fraction of
    /// required features is absent.
    pub fn assemble(
        &self,
        store: &MonitorStore,
        location: &Location,
        as_of: DateTime<Utc>,
    ) -> AppResult<FeatureVector> {
        let mut vector = FeatureVector::new(location.id, as_of);
        let mut absent = 0usize;

        for kind in REQUIRED_KINDS {
            let fresh = store
                .latest_reading(location.id, kind, as_of)
                .filter(|r| as_of - r.timestamp <= self.staleness_window)
                .filter(|r| r.quality != QualityFlag::Missing);

            match fresh {
                Some(reading) => {
                    vector.set(kind.as_str(), reading.value);
                    vector.inputs.push(reading.key());
                }
                None => {
                    absent += 1;
                    vector.set_absent(kind);
                }
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let absent_fraction = absent as f64 / REQUIRED_KINDS.len() as f64;
        if absent_fraction > self.max_absent_fraction {
            return Err(AppError::InsufficientData(format!(
                "{absent} of {} required features absent for location '{}'",
                REQUIRED_KINDS.len(),
                location.name
            )));
        }

        Ok(vector)
    }
}
