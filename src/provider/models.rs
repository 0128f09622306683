//! Wire formats for the external observation APIs, trimmed to the fields
//! the clients read.

use serde::Deserialize;

/// NOAA CO-OPS `datagetter` response:
/// `{"data": [{"t": "2025-08-06 14:24", "v": "1.234", ...}]}`, or
/// `{"error": {"message": "..."}}` when the request produced no data.
#[derive(Debug, Deserialize)]
pub struct CoopsResponse {
    #[serde(default)]
    pub data: Vec<CoopsRecord>,
    #[serde(default)]
    pub error: Option<CoopsError>,
}

#[derive(Debug, Deserialize)]
pub struct CoopsError {
    pub message: String,
}

/// One CO-OPS record. Values arrive as strings and fields are
/// product-specific: `v` carries the primary value (water level, pressure,
/// temperature), wind products use `s` (speed) and `d` (direction).
#[derive(Clone, Debug, Deserialize)]
pub struct CoopsRecord {
    pub t: String,
    #[serde(default)]
    pub v: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub d: Option<String>,
}

/// USGS NWIS instantaneous-values response:
/// `value.timeSeries[].values[].value[]`.
#[derive(Debug, Deserialize)]
pub struct NwisResponse {
    pub value: NwisValue,
}

#[derive(Debug, Deserialize)]
pub struct NwisValue {
    #[serde(rename = "timeSeries", default)]
    pub time_series: Vec<NwisTimeSeries>,
}

#[derive(Debug, Deserialize)]
pub struct NwisTimeSeries {
    pub variable: NwisVariable,
    #[serde(default)]
    pub values: Vec<NwisValues>,
}

#[derive(Debug, Deserialize)]
pub struct NwisVariable {
    #[serde(rename = "variableCode")]
    pub variable_code: Vec<NwisVariableCode>,
    pub unit: NwisUnit,
}

#[derive(Debug, Deserialize)]
pub struct NwisVariableCode {
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct NwisUnit {
    #[serde(rename = "unitCode")]
    pub unit_code: String,
}

#[derive(Debug, Deserialize)]
pub struct NwisValues {
    #[serde(default)]
    pub value: Vec<NwisPoint>,
}

#[derive(Debug, Deserialize)]
pub struct NwisPoint {
    pub value: String,
    #[serde(rename = "dateTime")]
    pub date_time: String,
}
