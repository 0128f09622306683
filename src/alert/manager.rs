//! Alert lifecycle state machine.
//!
//! `none → active → resolved` and `active → dismissed`; both terminal
//! states end the episode, and a later triggering assessment starts a new
//! one. At most one active alert exists per (location, hazard): a
//! triggering assessment refreshes the existing alert instead of creating
//! a duplicate. All transitions run under a single mutex, which is the
//! serialization boundary between assessment-driven updates and explicit
//! resolution commands.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    Alert, AlertSeverity, AlertStatus, FeatureVector, HazardKind, RiskAssessment, RiskLevel,
};
use crate::error::{AppError, AppResult};
use crate::store::MonitorStore;

/// Hazard classification cutoffs applied to the triggering feature snapshot.
const FLOOD_WATER_LEVEL_M: f64 = 5.0;
const HIGH_WAVES_M: f64 = 8.0;
const STORM_WIND_MS: f64 = 25.0;

#[derive(Clone, Debug)]
pub struct AlertPolicy {
    /// Minimum risk level that triggers an alert.
    pub threshold: RiskLevel,
    /// Window during which an active alert's severity may be upgraded but
    /// not downgraded or re-created.
    pub cooldown: Duration,
    /// When set, a below-threshold assessment resolves the location's
    /// active alerts (actor "system"). Off by default: a stale alert is
    /// safer than a missed hazard.
    pub auto_resolve: bool,
}

impl AlertPolicy {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.alert_threshold,
            cooldown: Duration::seconds(i64::try_from(config.alert_cooldown_seconds).unwrap_or(0)),
            auto_resolve: config.alert_auto_resolve,
        }
    }
}

/// What an assessment did to the alert state.
#[derive(Clone, Debug, PartialEq)]
pub enum AlertOutcome {
    Created(Alert),
    Updated(Alert),
    AutoResolved(Vec<Alert>),
    NoAction,
}

pub struct AlertManager {
    store: Arc<MonitorStore>,
    policy: AlertPolicy,
    /// Serializes all alert transitions.
    transitions: Mutex<()>,
}

impl AlertManager {
    #[must_use]
    pub fn new(store: Arc<MonitorStore>, policy: AlertPolicy) -> Self {
        Self {
            store,
            policy,
            transitions: Mutex::new(()),
        }
    }

    /// Evaluate a fresh assessment against the alert state machine.
    pub async fn evaluate(&self, assessment: &RiskAssessment) -> AlertOutcome {
        let _guard = self.transitions.lock().await;
        let now = assessment.computed_at;

        if assessment.level < self.policy.threshold {
            if !self.policy.auto_resolve {
                return AlertOutcome::NoAction;
            }
            let resolved = self.resolve_all_for_location(assessment.location_id);
            return if resolved.is_empty() {
                AlertOutcome::NoAction
            } else {
                AlertOutcome::AutoResolved(resolved)
            };
        }

        let hazard = classify_hazard(&assessment.features);
        let severity = AlertSeverity::from(assessment.level);

        if let Some(existing) = self.store.active_alert(assessment.location_id, hazard) {
            let within_cooldown = now - existing.updated_at < self.policy.cooldown;
            let updated = self.store.update_alert(existing.id, |alert| {
                alert.updated_at = now;
                alert.assessment_id = assessment.id;
                if severity > alert.severity || !within_cooldown {
                    alert.severity = severity;
                }
            });
            if let Some(alert) = updated {
                tracing::debug!(
                    alert_id = %alert.id,
                    hazard = %hazard,
                    severity = %alert.severity,
                    "Refreshed active alert"
                );
                return AlertOutcome::Updated(alert);
            }
        }

        let location_name = self
            .store
            .location(assessment.location_id)
            .map_or_else(|| assessment.location_id.to_string(), |l| l.name);

        let alert = Alert {
            id: Uuid::new_v4(),
            location_id: assessment.location_id,
            hazard,
            severity,
            status: AlertStatus::Active,
            title: format!("{} Alert - {location_name}", hazard.display_name()),
            message: format!(
                "High risk detected at {location_name}. Risk score: {:.2} ({}). \
                 Please review current conditions and take appropriate action.",
                assessment.score,
                assessment.level.as_str().to_uppercase()
            ),
            assessment_id: assessment.id,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            resolved_by: None,
        };

        self.store.insert_alert(alert.clone());
        tracing::info!(
            alert_id = %alert.id,
            location = %location_name,
            hazard = %hazard,
            severity = %alert.severity,
            "Alert created"
        );
        AlertOutcome::Created(alert)
    }

    /// Explicitly resolve an alert. Idempotent: resolving an already
    /// resolved alert returns it unchanged.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; `BadRequest` when the alert was
    /// dismissed (terminal for the episode).
    pub async fn resolve(&self, alert_id: Uuid, actor: &str) -> AppResult<Alert> {
        let _guard = self.transitions.lock().await;
        let alert = self
            .store
            .alert(alert_id)
            .ok_or_else(|| AppError::NotFound(format!("Alert {alert_id} not found")))?;

        match alert.status {
            AlertStatus::Resolved => Ok(alert),
            AlertStatus::Dismissed => Err(AppError::BadRequest(format!(
                "Alert {alert_id} was dismissed and cannot be resolved"
            ))),
            AlertStatus::Active => {
                let now = Utc::now();
                let actor = actor.to_string();
                let updated = self.store.update_alert(alert_id, |a| {
                    a.status = AlertStatus::Resolved;
                    a.resolved_at = Some(now);
                    a.resolved_by = Some(actor);
                    a.updated_at = now;
                });
                updated.ok_or_else(|| {
                    AppError::Internal(format!("Alert {alert_id} vanished during resolve"))
                })
                .inspect(|a| {
                    tracing::info!(alert_id = %a.id, actor = ?a.resolved_by, "Alert resolved");
                })
            }
        }
    }

    /// Explicitly dismiss an alert. Idempotent for already-dismissed alerts.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown id; `BadRequest` when the alert was
    /// resolved (terminal for the episode).
    pub async fn dismiss(&self, alert_id: Uuid, actor: &str) -> AppResult<Alert> {
        let _guard = self.transitions.lock().await;
        let alert = self
            .store
            .alert(alert_id)
            .ok_or_else(|| AppError::NotFound(format!("Alert {alert_id} not found")))?;

        match alert.status {
            AlertStatus::Dismissed => Ok(alert),
            AlertStatus::Resolved => Err(AppError::BadRequest(format!(
                "Alert {alert_id} was resolved and cannot be dismissed"
            ))),
            AlertStatus::Active => {
                let now = Utc::now();
                let actor = actor.to_string();
                let updated = self.store.update_alert(alert_id, |a| {
                    a.status = AlertStatus::Dismissed;
                    a.resolved_at = Some(now);
                    a.resolved_by = Some(actor);
                    a.updated_at = now;
                });
                updated.ok_or_else(|| {
                    AppError::Internal(format!("Alert {alert_id} vanished during dismiss"))
                })
                .inspect(|a| {
                    tracing::info!(alert_id = %a.id, actor = ?a.resolved_by, "Alert dismissed");
                })
            }
        }
    }

    fn resolve_all_for_location(&self, location_id: Uuid) -> Vec<Alert> {
        let now = Utc::now();
        self.store
            .alerts(Some(AlertStatus::Active))
            .into_iter()
            .filter(|a| a.location_id == location_id)
            .filter_map(|a| {
                self.store.update_alert(a.id, |alert| {
                    alert.status = AlertStatus::Resolved;
                    alert.resolved_at = Some(now);
                    alert.resolved_by = Some("system".to_string());
                    alert.updated_at = now;
                })
            })
            .inspect(|a| {
                tracing::info!(alert_id = %a.id, "Alert auto-resolved below threshold");
            })
            .collect()
    }
}

/// Pick the hazard the triggering conditions most indicate.
#[must_use]
pub fn classify_hazard(features: &FeatureVector) -> HazardKind {
    let get = |name: &str| features.get(name).unwrap_or(0.0);

    if get("water_level") > FLOOD_WATER_LEVEL_M {
        HazardKind::CoastalFlooding
    } else if get("wave_height") > HIGH_WAVES_M {
        HazardKind::HighWaves
    } else if get("wind_speed") > STORM_WIND_MS {
        HazardKind::StormSurge
    } else {
        HazardKind::General
    }
}
