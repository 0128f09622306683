use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::assessment::RiskLevel;

/// Hazard categories an alert can track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    StormSurge,
    HighWaves,
    CoastalFlooding,
    Erosion,
    WaterQuality,
    General,
}

impl HazardKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StormSurge => "storm_surge",
            Self::HighWaves => "high_waves",
            Self::CoastalFlooding => "coastal_flooding",
            Self::Erosion => "erosion",
            Self::WaterQuality => "water_quality",
            Self::General => "general",
        }
    }

    /// Human-readable title fragment, e.g. "Coastal Flooding".
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::StormSurge => "Storm Surge",
            Self::HighWaves => "High Waves",
            Self::CoastalFlooding => "Coastal Flooding",
            Self::Erosion => "Coastal Erosion",
            Self::WaterQuality => "Water Quality",
            Self::General => "General",
        }
    }
}

impl fmt::Display for HazardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Urgent,
    Critical,
}

impl From<RiskLevel> for AlertSeverity {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => Self::Info,
            RiskLevel::Medium => Self::Warning,
            RiskLevel::High => Self::Urgent,
            RiskLevel::Critical => Self::Critical,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
    Dismissed,
}

/// A tracked hazard episode. Status and resolution fields are written only
/// by the alert manager's transitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub location_id: Uuid,
    pub hazard: HazardKind,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    /// Assessment that triggered (or most recently refreshed) this alert.
    pub assessment_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl Alert {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}
