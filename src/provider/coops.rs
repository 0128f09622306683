use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::domain::MeasurementKind;
use crate::error::{AppError, AppResult};
use crate::provider::models::CoopsResponse;
use crate::provider::RawObservation;

/// Products requested per station, with the kind each one's primary value
/// maps onto. Wind is special-cased: one record carries speed and direction.
const PRODUCTS: [(&str, MeasurementKind); 3] = [
    ("water_level", MeasurementKind::WaterLevel),
    ("air_pressure", MeasurementKind::AirPressure),
    ("water_temperature", MeasurementKind::WaterTemperature),
];

/// Client for the NOAA CO-OPS Tides & Currents `datagetter` API.
pub struct CoopsClient {
    http_client: Client,
    base_url: String,
}

impl CoopsClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.provider_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.coops_base_url.clone(),
        }
    }

    /// Fetch all supported products for a station since `since`.
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
        let mut observations = Vec::new();

        for (product, kind) in PRODUCTS {
            let response = self.fetch_product(station_id, product, since).await?;
            for record in &response.data {
                let Some(timestamp) = parse_timestamp(&record.t) else {
                    tracing::debug!(station_id, product, raw = %record.t, "Skipping record with bad timestamp");
                    continue;
                };
                let Some(value) = record.v.as_deref().and_then(|v| v.parse::<f64>().ok()) else {
                    continue;
                };
                observations.push(RawObservation {
                    kind,
                    value,
                    unit: coops_unit(kind).to_string(),
                    timestamp,
                });
            }
        }

        // Wind: one record carries both speed ("s") and direction ("d").
        let response = self.fetch_product(station_id, "wind", since).await?;
        for record in &response.data {
            let Some(timestamp) = parse_timestamp(&record.t) else {
                tracing::debug!(station_id, product = "wind", raw = %record.t, "Skipping record with bad timestamp");
                continue;
            };
            if let Some(speed) = record.s.as_deref().and_then(|s| s.parse::<f64>().ok()) {
                observations.push(RawObservation {
                    kind: MeasurementKind::WindSpeed,
                    value: speed,
                    unit: "m/s".to_string(),
                    timestamp,
                });
            }
            if let Some(direction) = record.d.as_deref().and_then(|d| d.parse::<f64>().ok()) {
                observations.push(RawObservation {
                    kind: MeasurementKind::WindDirection,
                    value: direction,
                    unit: "degrees".to_string(),
                    timestamp,
                });
            }
        }

        Ok(observations)
    }

    async fn fetch_product(
        &self,
        station_id: &str,
        product: &str,
        since: DateTime<Utc>,
    ) -> AppResult<CoopsResponse> {
        let begin_date = since.format("%Y%m%d %H:%M").to_string();
        let end_date = Utc::now().format("%Y%m%d %H:%M").to_string();

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("begin_date", begin_date.as_str()),
                ("end_date", end_date.as_str()),
                ("station", station_id),
                ("product", product),
                ("datum", "MLLW"),
                ("units", "metric"),
                ("time_zone", "gmt"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("CO-OPS request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::ProviderUnavailable(
                "CO-OPS rate limited (429)".to_string(),
            ));
        }

        if !response.status().is_success() {
            return Err(AppError::ProviderUnavailable(format!(
                "CO-OPS HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let parsed: CoopsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderDataMalformed(format!("CO-OPS response: {e}")))?;

        // "No data was found" is a normal empty window, not a failure.
        if let Some(error) = &parsed.error {
            if error.message.contains("No data") {
                return Ok(CoopsResponse {
                    data: Vec::new(),
                    error: None,
                });
            }
            return Err(AppError::ProviderDataMalformed(format!(
                "CO-OPS error for station {station_id}: {}",
                error.message
            )));
        }

        Ok(parsed)
    }
}

/// CO-OPS timestamps are "YYYY-MM-DD HH:MM" in GMT (we request time_zone=gmt).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Units the metric datagetter reports per product.
fn coops_unit(kind: MeasurementKind) -> &'static str {
    match kind {
        MeasurementKind::AirPressure => "mb",
        MeasurementKind::WaterTemperature => "celsius",
        _ => "m",
    }
}
