use std::env;
use std::str::FromStr;

use crate::domain::{RiskBands, RiskLevel};

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Providers
    pub providers: Vec<String>,
    pub coops_base_url: String,
    pub nwis_base_url: String,
    pub provider_timeout_seconds: u64,

    // Ingestion
    pub ingest_interval_seconds: u64,
    pub ingest_window_minutes: i64,
    pub ingest_retry_max: u32,
    pub ingest_retry_base_delay_ms: u64,
    pub cycle_deadline_seconds: u64,

    // Scoring
    pub scoring_interval_seconds: u64,
    pub staleness_window_minutes: i64,
    pub max_absent_fraction: f64,
    pub model_version: String,
    pub model_dir: String,
    pub inference_timeout_seconds: u64,
    pub risk_bands: RiskBands,

    // Alerting
    pub alert_threshold: RiskLevel,
    pub alert_cooldown_seconds: u64,
    pub alert_auto_resolve: bool,

    // Cleanup
    pub cleanup_interval_seconds: u64,
    pub reading_retention_days: i64,
    pub assessment_retention_days: i64,
    pub alert_retention_days: i64,

    // Application metadata
    pub locations_file: Option<String>,
    pub deployment: Deployment,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,

            providers: vec!["coops".to_string(), "nwis".to_string()],
            coops_base_url: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter"
                .to_string(),
            nwis_base_url: "https://waterservices.usgs.gov/nwis/iv/".to_string(),
            provider_timeout_seconds: 30,

            ingest_interval_seconds: 300,
            ingest_window_minutes: 60,
            ingest_retry_max: 3,
            ingest_retry_base_delay_ms: 500,
            cycle_deadline_seconds: 120,

            scoring_interval_seconds: 900,
            staleness_window_minutes: 360,
            max_absent_fraction: 0.5,
            model_version: "baseline-v1".to_string(),
            model_dir: "models".to_string(),
            inference_timeout_seconds: 10,
            risk_bands: RiskBands::default(),

            alert_threshold: RiskLevel::High,
            // Derived from the scoring cadence: 2 scoring intervals
            alert_cooldown_seconds: 1800,
            alert_auto_resolve: false,

            cleanup_interval_seconds: 21_600,
            reading_retention_days: 30,
            assessment_retention_days: 90,
            alert_retention_days: 30,

            locations_file: None,
            deployment: Deployment::Local,
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables, falling back to the
    /// documented defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a set variable fails validation
    /// (e.g. non-ascending risk band edges).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let scoring_interval_seconds =
            parse_env("SCORING_INTERVAL_SECONDS", defaults.scoring_interval_seconds);

        let alert_threshold = match env::var("ALERT_THRESHOLD") {
            Ok(raw) => RiskLevel::from_str(&raw).map_err(ConfigError::Invalid)?,
            Err(_) => defaults.alert_threshold,
        };

        let config = Self {
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_env("API_PORT", defaults.api_port),

            providers: env::var("PROVIDERS")
                .map(|raw| {
                    raw.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.providers),
            coops_base_url: env::var("COOPS_BASE_URL").unwrap_or(defaults.coops_base_url),
            nwis_base_url: env::var("NWIS_BASE_URL").unwrap_or(defaults.nwis_base_url),
            provider_timeout_seconds: parse_env(
                "PROVIDER_TIMEOUT_SECONDS",
                defaults.provider_timeout_seconds,
            ),

            ingest_interval_seconds: parse_env(
                "INGEST_INTERVAL_SECONDS",
                defaults.ingest_interval_seconds,
            ),
            ingest_window_minutes: parse_env(
                "INGEST_WINDOW_MINUTES",
                defaults.ingest_window_minutes,
            ),
            ingest_retry_max: parse_env("INGEST_RETRY_MAX", defaults.ingest_retry_max),
            ingest_retry_base_delay_ms: parse_env(
                "INGEST_RETRY_BASE_DELAY_MS",
                defaults.ingest_retry_base_delay_ms,
            ),
            cycle_deadline_seconds: parse_env(
                "CYCLE_DEADLINE_SECONDS",
                defaults.cycle_deadline_seconds,
            ),

            scoring_interval_seconds,
            staleness_window_minutes: parse_env(
                "STALENESS_WINDOW_MINUTES",
                defaults.staleness_window_minutes,
            ),
            max_absent_fraction: parse_env("MAX_ABSENT_FRACTION", defaults.max_absent_fraction),
            model_version: env::var("MODEL_VERSION").unwrap_or(defaults.model_version),
            model_dir: env::var("MODEL_DIR").unwrap_or(defaults.model_dir),
            inference_timeout_seconds: parse_env(
                "INFERENCE_TIMEOUT_SECONDS",
                defaults.inference_timeout_seconds,
            ),
            risk_bands: RiskBands {
                medium: parse_env("RISK_BAND_MEDIUM", defaults.risk_bands.medium),
                high: parse_env("RISK_BAND_HIGH", defaults.risk_bands.high),
                critical: parse_env("RISK_BAND_CRITICAL", defaults.risk_bands.critical),
            },

            alert_threshold,
            alert_cooldown_seconds: parse_env(
                "ALERT_COOLDOWN_SECONDS",
                // Derived from the scoring cadence when unset
                2 * scoring_interval_seconds,
            ),
            alert_auto_resolve: parse_env("ALERT_AUTO_RESOLVE", defaults.alert_auto_resolve),

            cleanup_interval_seconds: parse_env(
                "CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            ),
            reading_retention_days: parse_env(
                "READING_RETENTION_DAYS",
                defaults.reading_retention_days,
            ),
            assessment_retention_days: parse_env(
                "ASSESSMENT_RETENTION_DAYS",
                defaults.assessment_retention_days,
            ),
            alert_retention_days: parse_env("ALERT_RETENTION_DAYS", defaults.alert_retention_days),

            locations_file: env::var("LOCATIONS_FILE").ok(),
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.risk_bands.validate().map_err(ConfigError::Invalid)?;
        if !(0.0..=1.0).contains(&self.max_absent_fraction) {
            return Err(ConfigError::Invalid(format!(
                "MAX_ABSENT_FRACTION {} must lie in [0, 1]",
                self.max_absent_fraction
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
