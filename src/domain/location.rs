use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A coastal monitoring location. Created at configuration time and rarely
/// mutated afterwards; deactivated rather than deleted so that stored
/// readings keep a valid owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Station identifier per provider source, e.g. `{"coops": "8723214"}`.
    #[serde(default)]
    pub station_ids: HashMap<String, String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Location {
    fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} out of range", self.longitude));
        }
        if self.name.is_empty() {
            return Err("empty name".to_string());
        }
        Ok(())
    }
}

/// Load monitored locations from a JSON file, or fall back to the built-in
/// default set when no file is configured.
///
/// # Errors
///
/// Returns `AppError::Internal` if the file cannot be read or parsed, or if
/// any location fails coordinate validation.
pub fn load_locations(path: Option<&str>) -> AppResult<Vec<Location>> {
    let locations = match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .map_err(|e| AppError::Internal(format!("Failed to read locations file {p}: {e}")))?;
            serde_json::from_str::<Vec<Location>>(&raw)
                .map_err(|e| AppError::Internal(format!("Failed to parse locations file {p}: {e}")))?
        }
        None => default_locations(),
    };

    for location in &locations {
        location
            .validate()
            .map_err(|e| AppError::Internal(format!("Invalid location '{}': {e}", location.name)))?;
    }

    Ok(locations)
}

/// Built-in demo set of U.S. coastal stations.
#[must_use]
pub fn default_locations() -> Vec<Location> {
    let entries: [(&str, f64, f64, &str, &str); 5] = [
        (
            "Miami Beach",
            25.7617,
            -80.1918,
            "8723214",
            "Popular beach location in Miami, Florida",
        ),
        (
            "Virginia Beach",
            36.8529,
            -75.9780,
            "8638863",
            "Major beach resort city in Virginia",
        ),
        (
            "Monterey Bay",
            36.6002,
            -121.8947,
            "9413450",
            "Marine sanctuary in California",
        ),
        (
            "Charleston Harbor",
            32.7767,
            -79.9311,
            "8665530",
            "Historic harbor in South Carolina",
        ),
        (
            "Key West",
            24.5551,
            -81.8065,
            "8724580",
            "Southernmost point in Florida Keys",
        ),
    ];

    entries
        .into_iter()
        .map(|(name, latitude, longitude, station, description)| Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            latitude,
            longitude,
            station_ids: HashMap::from([("coops".to_string(), station.to_string())]),
            description: description.to_string(),
            is_active: true,
        })
        .collect()
}
