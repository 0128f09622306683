//! Periodic ingestion, scoring, and cleanup.

pub mod scheduler;
pub mod worker;

pub use worker::{CycleReport, PairFailure};
