//! Periodic pipeline loops.
//!
//! Ingestion, scoring, and cleanup run as independent interval tasks; each
//! loop awaits its own cycle, so at most one cycle per task type is ever
//! in flight. A cycle that exceeds its deadline is abandoned (partial
//! writes remain valid by idempotency) and reported; the next tick runs
//! normally.

use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;
use tokio::time::interval;

use crate::alert::AlertOutcome;
use crate::common::AppState;
use crate::error::AppError;
use crate::ingest::worker;

/// Run the ingestion task on a schedule.
pub async fn run_ingest_loop(state: AppState) {
    let interval_secs = state.config.ingest_interval_seconds;
    let deadline = Duration::from_secs(state.config.cycle_deadline_seconds);

    tracing::info!(interval_secs, "Starting ingestion scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;
        tracing::debug!("Running ingestion cycle...");

        match tokio::time::timeout(deadline, worker::run_ingest_cycle(&state)).await {
            Ok(report) => {
                tracing::info!(
                    written = report.readings_written,
                    duplicates = report.duplicates,
                    malformed = report.malformed_skipped,
                    missing = report.missing_kinds,
                    failed_pairs = report.failures.len(),
                    "Ingestion cycle completed"
                );
                let mut health = state.health.write().expect("health lock poisoned");
                health.record_ingest(Utc::now(), &report);
            }
            Err(_) => {
                tracing::error!(
                    deadline_secs = state.config.cycle_deadline_seconds,
                    "Ingestion cycle exceeded deadline, abandoned"
                );
                let mut health = state.health.write().expect("health lock poisoned");
                health.record_cycle_error("ingestion cycle exceeded deadline".to_string());
            }
        }
    }
}

/// Run the scoring task on a schedule. Scoring reads only stored readings,
/// so its cadence is independent of ingestion.
pub async fn run_scoring_loop(state: AppState) {
    let interval_secs = state.config.scoring_interval_seconds;
    let deadline = Duration::from_secs(state.config.cycle_deadline_seconds);

    tracing::info!(interval_secs, "Starting scoring scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;
        tracing::debug!("Running scoring cycle...");

        match tokio::time::timeout(deadline, run_scoring_cycle(&state)).await {
            Ok((assessed, failures)) => {
                tracing::info!(
                    assessed,
                    failures = failures.len(),
                    "Scoring cycle completed"
                );
                let mut health = state.health.write().expect("health lock poisoned");
                health.record_scoring(Utc::now(), assessed, failures);
            }
            Err(_) => {
                tracing::error!(
                    deadline_secs = state.config.cycle_deadline_seconds,
                    "Scoring cycle exceeded deadline, abandoned"
                );
                let mut health = state.health.write().expect("health lock poisoned");
                health.record_cycle_error("scoring cycle exceeded deadline".to_string());
            }
        }
    }
}

/// Assess every active location once. Per-location failures are contained
/// and returned for the health report.
async fn run_scoring_cycle(state: &AppState) -> (usize, Vec<String>) {
    let as_of = Utc::now();
    let mut assessed = 0usize;
    let mut failures = Vec::new();

    for location in state.store.active_locations() {
        match state.scorer.assess(&location, as_of).await {
            Ok(assessment) => {
                assessed += 1;
                match state.alerts.evaluate(&assessment).await {
                    AlertOutcome::Created(alert) => {
                        tracing::info!(
                            location = %location.name,
                            hazard = %alert.hazard,
                            severity = %alert.severity,
                            "New alert from scoring cycle"
                        );
                    }
                    AlertOutcome::Updated(_)
                    | AlertOutcome::AutoResolved(_)
                    | AlertOutcome::NoAction => {}
                }
            }
            Err(e @ AppError::InsufficientData(_)) => {
                tracing::warn!(location = %location.name, error = %e, "Scoring skipped");
                failures.push(format!("{}: {e}", location.name));
            }
            Err(e) => {
                tracing::error!(location = %location.name, error = %e, "Scoring failed");
                failures.push(format!("{}: {e}", location.name));
            }
        }
    }

    (assessed, failures)
}

/// Run the retention cleanup task on a schedule.
pub async fn run_cleanup_loop(state: AppState) {
    let interval_secs = state.config.cleanup_interval_seconds;

    tracing::info!(interval_secs, "Starting cleanup scheduler");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    // Skip the immediate first tick: there is nothing to clean at startup.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        tracing::debug!("Running cleanup cycle...");

        let now = Utc::now();
        let stats = state.store.cleanup(
            now,
            ChronoDuration::days(state.config.reading_retention_days),
            ChronoDuration::days(state.config.assessment_retention_days),
            ChronoDuration::days(state.config.alert_retention_days),
        );

        tracing::info!(
            readings = stats.readings_deleted,
            assessments = stats.assessments_deleted,
            alerts = stats.alerts_deleted,
            "Cleanup cycle completed"
        );

        let mut health = state.health.write().expect("health lock poisoned");
        health.record_cleanup(now, stats);
    }
}
