use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{FeatureVector, Location, RiskAssessment, RiskBands};
use crate::error::{AppError, AppResult};
use crate::scoring::features::FeatureAssembler;
use crate::scoring::model::{ModelRegistry, RiskModel};
use crate::store::MonitorStore;

/// Wraps the active model behind the stable inference contract: schema
/// validation before invocation, a bounded inference call, band
/// discretization, and an audit trail of which model version produced each
/// assessment.
pub struct RiskScorer {
    store: Arc<MonitorStore>,
    models: Arc<ModelRegistry>,
    assembler: FeatureAssembler,
    bands: RiskBands,
    inference_timeout: Duration,
}

impl RiskScorer {
    #[must_use]
    pub fn new(store: Arc<MonitorStore>, models: Arc<ModelRegistry>, config: &Config) -> Self {
        Self {
            store,
            models,
            assembler: FeatureAssembler::new(config),
            bands: config.risk_bands.clone(),
            inference_timeout: Duration::from_secs(config.inference_timeout_seconds),
        }
    }

    /// Assemble features and produce an assessment for one location.
    /// The assessment is written to the store before being returned.
    ///
    /// # Errors
    ///
    /// `InsufficientData` when assembly fails, `ModelLoadFailure` when the
    /// active model is not registered, `SchemaMismatch` on feature drift,
    /// `ModelInferenceFailure` on model error, timeout, or an out-of-range
    /// score. No assessment is written in any failure case.
    pub async fn assess(
        &self,
        location: &Location,
        as_of: DateTime<Utc>,
    ) -> AppResult<RiskAssessment> {
        let features = self.assembler.assemble(&self.store, location, as_of)?;
        let model = self.models.active()?;
        validate_schema(model.as_ref(), &features)?;

        let score = self.infer(model.clone(), features.clone()).await?;
        if !(0.0..=1.0).contains(&score) {
            return Err(AppError::ModelInferenceFailure(format!(
                "model {} produced out-of-range score {score}",
                model.version()
            )));
        }

        let assessment = RiskAssessment {
            id: Uuid::new_v4(),
            location_id: location.id,
            score,
            level: self.bands.classify(score),
            model_version: model.version().to_string(),
            features,
            computed_at: as_of,
        };

        tracing::debug!(
            location = %location.name,
            score,
            level = %assessment.level,
            model = %assessment.model_version,
            "Assessment computed"
        );

        self.store.insert_assessment(assessment.clone());
        Ok(assessment)
    }

    /// Run inference off the async runtime, bounded by the configured
    /// timeout.
    async fn infer(&self, model: Arc<dyn RiskModel>, features: FeatureVector) -> AppResult<f64> {
        let version = model.version().to_string();
        let handle = tokio::task::spawn_blocking(move || model.score(&features));

        match tokio::time::timeout(self.inference_timeout, handle).await {
            Err(_) => Err(AppError::ModelInferenceFailure(format!(
                "model {version} timed out after {:?}",
                self.inference_timeout
            ))),
            Ok(Err(join_error)) => Err(AppError::ModelInferenceFailure(format!(
                "model {version} panicked: {join_error}"
            ))),
            Ok(Ok(Err(e))) => Err(AppError::ModelInferenceFailure(format!(
                "model {version}: {e}"
            ))),
            Ok(Ok(Ok(score))) => Ok(score),
        }
    }
}

/// Fail fast when the model expects a feature the vector does not carry.
fn validate_schema(model: &dyn RiskModel, features: &FeatureVector) -> AppResult<()> {
    for name in model.input_schema() {
        if !features.has(name) {
            return Err(AppError::SchemaMismatch(format!(
                "model {} expects feature '{name}' not present in the vector",
                model.version()
            )));
        }
    }
    Ok(())
}
