//! External observation providers.
//!
//! Each client maps one provider's wire format onto the canonical
//! measurement vocabulary. Transport failures and error statuses surface as
//! `ProviderUnavailable` (transient, retried by the ingestion adapter);
//! unparseable payloads as `ProviderDataMalformed` (permanent for the
//! cycle). Individual malformed records are skipped, not fatal.

pub mod coops;
pub mod models;
pub mod nwis;
pub mod synthetic;

pub use coops::CoopsClient;
pub use nwis::NwisClient;
pub use synthetic::SyntheticProvider;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::domain::MeasurementKind;
use crate::error::AppResult;

/// A provider observation mapped to the canonical vocabulary but not yet
/// unit-normalized or validated.
#[derive(Clone, Debug, PartialEq)]
pub struct RawObservation {
    pub kind: MeasurementKind,
    pub value: f64,
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

pub enum ProviderClient {
    Coops(CoopsClient),
    Nwis(NwisClient),
    Synthetic(SyntheticProvider),
}

impl ProviderClient {
    /// Stable source identifier recorded on every reading this provider
    /// produces. Doubles as the key into `Location::station_ids`.
    #[must_use]
    pub fn source_id(&self) -> &str {
        match self {
            Self::Coops(_) => "coops",
            Self::Nwis(_) => "nwis",
            Self::Synthetic(p) => p.source_id(),
        }
    }

    /// Fetch raw observations for a station since the given instant.
    ///
    /// # Errors
    ///
    /// `ProviderUnavailable` on transport/status failures,
    /// `ProviderDataMalformed` on unparseable payloads.
    pub async fn get_observations(
        &self,
        station_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<RawObservation>> {
        match self {
            Self::Coops(client) => client.get_observations(station_id, since).await,
            Self::Nwis(client) => client.get_observations(station_id, since).await,
            Self::Synthetic(provider) => provider.get_observations(station_id, since),
        }
    }

    /// Build the providers enabled by configuration. Unknown names are
    /// logged and skipped.
    #[must_use]
    pub fn from_config(config: &Config) -> Vec<Self> {
        let mut clients = Vec::new();
        for name in &config.providers {
            match name.as_str() {
                "coops" => clients.push(Self::Coops(CoopsClient::new(config))),
                "nwis" => clients.push(Self::Nwis(NwisClient::new(config))),
                "synthetic" => clients.push(Self::Synthetic(SyntheticProvider::demo())),
                other => {
                    tracing::warn!(provider = other, "Unknown provider in PROVIDERS, skipping");
                }
            }
        }
        clients
    }
}
