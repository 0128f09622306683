//! Process-wide pipeline health.
//!
//! Explicit state object rather than ambient globals: initialized all-clear,
//! mutated once per cycle by the scheduler loops, and injectable for tests.
//! Consumed by the health endpoint as the pipeline's liveness signal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ingest::CycleReport;
use crate::store::CleanupStats;

/// Condensed outcome of the most recent ingestion cycle.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct IngestSummary {
    pub at: DateTime<Utc>,
    pub readings_written: usize,
    pub duplicates: usize,
    pub malformed_skipped: usize,
    pub missing_kinds: usize,
    pub failed_pairs: usize,
}

#[derive(Clone, Debug, Default, Serialize, ToSchema)]
pub struct PipelineHealth {
    pub last_ingest_success: Option<DateTime<Utc>>,
    pub last_scoring_success: Option<DateTime<Utc>>,
    pub last_cleanup_success: Option<DateTime<Utc>>,
    /// "location/provider" pairs degraded during the last ingestion cycle.
    pub degraded_pairs: Vec<String>,
    pub last_ingest: Option<IngestSummary>,
    pub locations_assessed: usize,
    /// Per-location scoring failures from the last scoring cycle.
    pub scoring_failures: Vec<String>,
    /// Deadline overrun or other cycle-level error, cleared on success.
    pub last_cycle_error: Option<String>,
}

impl PipelineHealth {
    /// All-clear initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_ingest(&mut self, now: DateTime<Utc>, report: &CycleReport) {
        self.last_ingest_success = Some(now);
        self.degraded_pairs = report
            .failures
            .iter()
            .map(|f| format!("{}/{}", f.location, f.provider))
            .collect();
        self.last_ingest = Some(IngestSummary {
            at: now,
            readings_written: report.readings_written,
            duplicates: report.duplicates,
            malformed_skipped: report.malformed_skipped,
            missing_kinds: report.missing_kinds,
            failed_pairs: report.failures.len(),
        });
        self.last_cycle_error = None;
    }

    pub fn record_scoring(&mut self, now: DateTime<Utc>, assessed: usize, failures: Vec<String>) {
        self.last_scoring_success = Some(now);
        self.locations_assessed = assessed;
        self.scoring_failures = failures;
        self.last_cycle_error = None;
    }

    pub fn record_cleanup(&mut self, now: DateTime<Utc>, _stats: CleanupStats) {
        self.last_cleanup_success = Some(now);
    }

    pub fn record_cycle_error(&mut self, error: String) {
        self.last_cycle_error = Some(error);
    }
}
