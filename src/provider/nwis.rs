use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::domain::MeasurementKind;
use crate::error::{AppError, AppResult};
use crate::provider::models::NwisResponse;
use crate::provider::RawObservation;

/// USGS no-data sentinel.
const NO_DATA: &str = "-999999";

/// Client for the USGS NWIS Water Services instantaneous-values API.
pub struct NwisClient {
    http_client: Client,
    base_url: String,
}

impl NwisClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.nwis_base_url.clone(),
        }
    }

    /// Fetch gage height and water temperature for a site since `since`.
    ///
    /// # Errors
    ///
    /// `ProviderUnavailable` on transport or status failures,
    /// `ProviderDataMalformed` on unparseable payloads.
    pub async fn get_observations(
        &self,
        station_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<RawObservation>> {
        let start = since.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("format", "json"),
                ("sites", station_id),
                ("startDT", start.as_str()),
                // 00065 = gage height (ft), 00010 = water temperature (degC)
                ("parameterCd", "00065,00010"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("NWIS request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::ProviderUnavailable(
                "NWIS rate limited (429)".to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "NWIS HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let parsed: NwisResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderDataMalformed(format!("NWIS response: {e}")))?;

        let mut observations = Vec::new();

        for series in &parsed.value.time_series {
            let Some(code) = series.variable.variable_code.first() else {
                continue;
            };
            let kind = match code.value.as_str() {
                "00065" => MeasurementKind::WaterLevel,
                "00010" => MeasurementKind::WaterTemperature,
                other => {
                    tracing::debug!(station_id, parameter = other, "Skipping unmapped parameter");
                    continue;
                }
            };
            let unit = series.variable.unit.unit_code.clone();

            for point in series.values.iter().flat_map(|v| v.value.iter()) {
                if point.value == NO_DATA {
                    continue;
                }
                let Ok(value) = point.value.parse::<f64>() else {
                    tracing::debug!(station_id, raw = %point.value, "Skipping unparseable value");
                    continue;
                };
                let Ok(timestamp) = DateTime::parse_from_rfc3339(&point.date_time) else {
                    tracing::debug!(station_id, raw = %point.date_time, "Skipping record with bad timestamp");
                    continue;
                };
                observations.push(RawObservation {
                    kind,
                    value,
                    unit: unit.clone(),
                    timestamp: timestamp.with_timezone(&Utc),
                });
            }
        }

        Ok(observations)
    }
}
