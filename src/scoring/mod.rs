//! Feature assembly and risk scoring.

pub mod features;
pub mod model;
pub mod scorer;

pub use features::FeatureAssembler;
pub use model::{BaselineModel, LinearModel, ModelRegistry, RiskModel};
pub use scorer::RiskScorer;
