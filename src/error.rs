use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Provider data malformed: {0}")]
    ProviderDataMalformed(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Model load failure: {0}")]
    ModelLoadFailure(String),

    #[error("Model inference failure: {0}")]
    ModelInferenceFailure(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Transient failures are retried with bounded backoff by the ingestion
    /// adapter; everything else is permanent for the cycle.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::ProviderUnavailable(msg) => {
                tracing::error!("Provider unavailable: {msg}");
                (StatusCode::BAD_GATEWAY, format!("Provider unavailable: {msg}"))
            }
            Self::ProviderDataMalformed(msg) => {
                tracing::error!("Provider data malformed: {msg}");
                (StatusCode::BAD_GATEWAY, format!("Provider data malformed: {msg}"))
            }
            Self::InsufficientData(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, format!("Insufficient data: {msg}"))
            }
            Self::SchemaMismatch(msg) => {
                tracing::error!("Feature schema mismatch: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, format!("Feature schema mismatch: {msg}"))
            }
            Self::ModelLoadFailure(msg) => {
                tracing::error!("Model load failure: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, format!("Model load failure: {msg}"))
            }
            Self::ModelInferenceFailure(msg) => {
                tracing::error!("Model inference failure: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, format!("Model inference failure: {msg}"))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
