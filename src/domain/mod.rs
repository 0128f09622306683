//! Core domain types shared across the pipeline.

pub mod alert;
pub mod assessment;
pub mod features;
pub mod location;
pub mod reading;

pub use alert::{Alert, AlertSeverity, AlertStatus, HazardKind};
pub use assessment::{RiskAssessment, RiskBands, RiskLevel};
pub use features::FeatureVector;
pub use location::Location;
pub use reading::{MeasurementKind, QualityFlag, Reading, ReadingKey};
