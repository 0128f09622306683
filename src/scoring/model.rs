//! Pluggable risk models.
//!
//! Model implementations vary in internal structure; the pipeline sees a
//! single capability: `score(FeatureVector) -> probability`. The registry
//! maps version identifiers to implementations and is the model-artifact
//! loader boundary: the active version is selected by configuration and
//! hot-swappable at runtime without pipeline changes.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::domain::features::FEATURE_SCHEMA;
use crate::domain::FeatureVector;
use crate::error::{AppError, AppResult};

pub trait RiskModel: Send + Sync {
    fn version(&self) -> &str;

    /// Feature names the model expects to find in its input vector.
    fn input_schema(&self) -> &[String];

    /// Probability of hazardous conditions, in [0, 1].
    ///
    /// # Errors
    ///
    /// Implementations report any internal failure; the scorer maps it to
    /// `ModelInferenceFailure` and skips the assessment.
    fn score(&self, features: &FeatureVector) -> AppResult<f64>;
}

/// Built-in heuristic baseline. Scores the same danger conditions the
/// reference classifier was trained on: elevated water level, high waves,
/// storm winds under low pressure, and unusual water temperature.
pub struct BaselineModel {
    schema: Vec<String>,
}

impl BaselineModel {
    pub const VERSION: &'static str = "baseline-v1";

    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: FEATURE_SCHEMA.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Default for BaselineModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskModel for BaselineModel {
    fn version(&self) -> &str {
        Self::VERSION
    }

    fn input_schema(&self) -> &[String] {
        &self.schema
    }

    fn score(&self, features: &FeatureVector) -> AppResult<f64> {
        let get = |name: &str| features.get(name).unwrap_or(0.0);

        let water_level = get("water_level");
        let wave_height = get("wave_height");
        let wind_speed = get("wind_speed");
        let air_pressure = get("air_pressure");
        let water_temperature = get("water_temperature");

        // Saturating contribution per condition, strongest dominating.
        let mut score: f64 = 0.05;
        score = score.max(ramp(water_level, 2.0, 6.0));
        score = score.max(ramp(wave_height, 2.0, 8.0));
        if air_pressure < 1000.0 {
            score = score.max(ramp(wind_speed, 10.0, 25.0));
        } else {
            score = score.max(0.7 * ramp(wind_speed, 10.0, 25.0));
        }
        score = score.max(0.6 * ramp(water_temperature, 28.0, 35.0));

        Ok(score.clamp(0.0, 1.0))
    }
}

/// Linear interpolation of `value` from 0 at `low` to 1 at `high`.
fn ramp(value: f64, low: f64, high: f64) -> f64 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// JSON model artifact: logistic regression weights over named features.
#[derive(Clone, Debug, Deserialize)]
pub struct ModelArtifact {
    pub version: String,
    pub features: Vec<String>,
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub bias: f64,
}

/// Model loaded from a JSON artifact: sigmoid of a weighted feature sum.
pub struct LinearModel {
    artifact: ModelArtifact,
}

impl LinearModel {
    /// Load an artifact file.
    ///
    /// # Errors
    ///
    /// `ModelLoadFailure` when the file is unreadable or invalid.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ModelLoadFailure(format!("Failed to read {}: {e}", path.display()))
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::ModelLoadFailure(format!("Failed to parse {}: {e}", path.display()))
        })?;

        if artifact.version.is_empty() {
            return Err(AppError::ModelLoadFailure(format!(
                "Artifact {} has an empty version",
                path.display()
            )));
        }
        for feature in &artifact.features {
            if !artifact.weights.contains_key(feature) {
                return Err(AppError::ModelLoadFailure(format!(
                    "Artifact {} is missing a weight for feature '{feature}'",
                    path.display()
                )));
            }
        }

        Ok(Self { artifact })
    }
}

impl RiskModel for LinearModel {
    fn version(&self) -> &str {
        &self.artifact.version
    }

    fn input_schema(&self) -> &[String] {
        &self.artifact.features
    }

    fn score(&self, features: &FeatureVector) -> AppResult<f64> {
        let mut sum = self.artifact.bias;
        for name in &self.artifact.features {
            let value = features.get(name).ok_or_else(|| {
                AppError::ModelInferenceFailure(format!(
                    "feature '{name}' missing from input vector"
                ))
            })?;
            sum += self.artifact.weights[name] * value;
        }
        Ok(1.0 / (1.0 + (-sum).exp()))
    }
}

/// Registry of loaded models, keyed by version identifier.
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<dyn RiskModel>>>,
    active: RwLock<String>,
}

impl ModelRegistry {
    /// New registry with the built-in baseline registered and the given
    /// version marked active.
    #[must_use]
    pub fn new(active_version: &str) -> Self {
        let baseline: Arc<dyn RiskModel> = Arc::new(BaselineModel::new());
        let models = HashMap::from([(baseline.version().to_string(), baseline)]);

        Self {
            models: RwLock::new(models),
            active: RwLock::new(active_version.to_string()),
        }
    }

    /// Load every `*.json` artifact in a directory. Individual load
    /// failures are logged and skipped; a missing directory loads nothing.
    /// Returns the number of models loaded.
    pub fn load_dir(&self, dir: &Path) -> usize {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Model directory not readable, skipping");
                return 0;
            }
        };

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match LinearModel::from_file(&path) {
                Ok(model) => {
                    tracing::info!(version = model.version(), path = %path.display(), "Loaded model artifact");
                    self.register(Arc::new(model));
                    loaded += 1;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Failed to load model artifact");
                }
            }
        }
        loaded
    }

    pub fn register(&self, model: Arc<dyn RiskModel>) {
        let mut models = self.models.write().expect("registry lock poisoned");
        models.insert(model.version().to_string(), model);
    }

    /// Switch the active model by version identifier.
    ///
    /// # Errors
    ///
    /// `ModelLoadFailure` when the version is not registered.
    pub fn activate(&self, version: &str) -> AppResult<()> {
        let models = self.models.read().expect("registry lock poisoned");
        if !models.contains_key(version) {
            return Err(AppError::ModelLoadFailure(format!(
                "unknown model version '{version}'"
            )));
        }
        drop(models);

        let mut active = self.active.write().expect("registry lock poisoned");
        *active = version.to_string();
        tracing::info!(version, "Activated model");
        Ok(())
    }

    #[must_use]
    pub fn active_version(&self) -> String {
        self.active.read().expect("registry lock poisoned").clone()
    }

    /// Look up a model by version.
    ///
    /// # Errors
    ///
    /// `ModelLoadFailure` when the version is not registered.
    pub fn get(&self, version: &str) -> AppResult<Arc<dyn RiskModel>> {
        let models = self.models.read().expect("registry lock poisoned");
        models.get(version).cloned().ok_or_else(|| {
            AppError::ModelLoadFailure(format!("unknown model version '{version}'"))
        })
    }

    /// The currently active model.
    ///
    /// # Errors
    ///
    /// `ModelLoadFailure` when the active version is not registered.
    pub fn active(&self) -> AppResult<Arc<dyn RiskModel>> {
        self.get(&self.active_version())
    }

    #[must_use]
    pub fn versions(&self) -> Vec<String> {
        let models = self.models.read().expect("registry lock poisoned");
        let mut versions: Vec<String> = models.keys().cloned().collect();
        versions.sort();
        versions
    }
}
