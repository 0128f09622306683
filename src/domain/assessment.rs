use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::features::FeatureVector;

/// Discretized risk level. Ordering follows severity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

/// Band edges mapping a score in [0,1] onto a `RiskLevel`:
/// low < medium ≤ score < high ≤ score < critical ≤ score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskBands {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            medium: 0.3,
            high: 0.6,
            critical: 0.8,
        }
    }
}

impl RiskBands {
    #[must_use]
    pub fn classify(&self, score: f64) -> RiskLevel {
        if score < self.medium {
            RiskLevel::Low
        } else if score < self.high {
            RiskLevel::Medium
        } else if score < self.critical {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    /// Band edges must be strictly ascending within (0, 1).
    pub fn validate(&self) -> Result<(), String> {
        let edges = [self.medium, self.high, self.critical];
        if edges.iter().any(|e| !(0.0..=1.0).contains(e)) {
            return Err(format!("band edges {edges:?} must lie in [0, 1]"));
        }
        if !(self.medium < self.high && self.high < self.critical) {
            return Err(format!("band edges {edges:?} must be strictly ascending"));
        }
        Ok(())
    }
}

/// A model's scored output for a location at a point in time. Immutable
/// once created; history per location is append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: Uuid,
    pub location_id: Uuid,
    /// Probability of hazardous conditions, in [0, 1].
    pub score: f64,
    pub level: RiskLevel,
    pub model_version: String,
    /// Snapshot of the inputs the model saw, including reading lineage.
    pub features: FeatureVector,
    pub computed_at: DateTime<Utc>,
}
