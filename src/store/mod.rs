//! In-memory monitoring store.
//!
//! Single shared mutable resource of the pipeline. Implements the
//! persistence contract the pipeline needs: insert-if-absent readings keyed
//! by (location, kind, timestamp, source), latest-per-(location, kind)
//! queries, append-only assessment history, and alert records. The inner
//! lock is never held across an await point.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Alert, AlertStatus, HazardKind, Location, MeasurementKind, Reading, ReadingKey, RiskAssessment,
};

#[derive(Default)]
struct StoreInner {
    locations: HashMap<Uuid, Location>,
    /// (location, kind) -> timestamp -> source -> reading
    readings: HashMap<(Uuid, MeasurementKind), BTreeMap<DateTime<Utc>, HashMap<String, Reading>>>,
    assessments: HashMap<Uuid, RiskAssessment>,
    /// Per-location assessment ids, oldest first.
    assessment_history: HashMap<Uuid, Vec<Uuid>>,
    alerts: HashMap<Uuid, Alert>,
    /// Deduplication index: at most one active alert per (location, hazard).
    active_alerts: HashMap<(Uuid, HazardKind), Uuid>,
}

#[derive(Default)]
pub struct MonitorStore {
    inner: RwLock<StoreInner>,
}

/// Counts from one retention sweep.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct CleanupStats {
    pub readings_deleted: usize,
    pub assessments_deleted: usize,
    pub alerts_deleted: usize,
}

impl MonitorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- locations ----

    pub fn upsert_location(&self, location: Location) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner.locations.insert(location.id, location);
    }

    #[must_use]
    pub fn location(&self, id: Uuid) -> Option<Location> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.locations.get(&id).cloned()
    }

    #[must_use]
    pub fn locations(&self) -> Vec<Location> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut all: Vec<Location> = inner.locations.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    #[must_use]
    pub fn active_locations(&self) -> Vec<Location> {
        self.locations().into_iter().filter(|l| l.is_active).collect()
    }

    /// Soft-deactivate (or reactivate) a location. Returns false when the
    /// location does not exist.
    pub fn set_location_active(&self, id: Uuid, active: bool) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        match inner.locations.get_mut(&id) {
            Some(location) => {
                location.is_active = active;
                true
            }
            None => false,
        }
    }

    // ---- readings ----

    /// Insert-if-absent. Returns false when a reading with the same
    /// (location, kind, timestamp, source) key already exists.
    pub fn insert_reading(&self, reading: Reading) -> bool {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let by_source = inner
            .readings
            .entry((reading.location_id, reading.kind))
            .or_default()
            .entry(reading.timestamp)
            .or_default();

        match by_source.entry(reading.source.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(reading);
                true
            }
        }
    }

    /// Latest reading of `kind` at or before `as_of`.
    #[must_use]
    pub fn latest_reading(
        &self,
        location_id: Uuid,
        kind: MeasurementKind,
        as_of: DateTime<Utc>,
    ) -> Option<Reading> {
        let inner = self.inner.read().expect("store lock poisoned");
        let (_, by_source) = inner
            .readings
            .get(&(location_id, kind))?
            .range(..=as_of)
            .next_back()?;
        // Multiple sources may report the same timestamp; pick deterministically.
        by_source
            .iter()
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, reading)| reading.clone())
    }

    /// Latest reading per kind for a location (current conditions view).
    #[must_use]
    pub fn latest_readings(&self, location_id: Uuid, as_of: DateTime<Utc>) -> Vec<Reading> {
        MeasurementKind::ALL
            .into_iter()
            .filter_map(|kind| self.latest_reading(location_id, kind, as_of))
            .collect()
    }

    #[must_use]
    pub fn reading_count(&self) -> usize {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .readings
            .values()
            .flat_map(|by_ts| by_ts.values())
            .map(HashMap::len)
            .sum()
    }

    // ---- assessments ----

    pub fn insert_assessment(&self, assessment: RiskAssessment) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        inner
            .assessment_history
            .entry(assessment.location_id)
            .or_default()
            .push(assessment.id);
        inner.assessments.insert(assessment.id, assessment);
    }

    #[must_use]
    pub fn assessment(&self, id: Uuid) -> Option<RiskAssessment> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.assessments.get(&id).cloned()
    }

    /// Assessment history for a location, newest first.
    #[must_use]
    pub fn assessments_for(&self, location_id: Uuid, limit: usize) -> Vec<RiskAssessment> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .assessment_history
            .get(&location_id)
            .map(|ids| {
                ids.iter()
                    .rev()
                    .take(limit)
                    .filter_map(|id| inner.assessments.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn latest_assessment(&self, location_id: Uuid) -> Option<RiskAssessment> {
        self.assessments_for(location_id, 1).into_iter().next()
    }

    // ---- alerts ----

    pub fn insert_alert(&self, alert: Alert) {
        let mut inner = self.inner.write().expect("store lock poisoned");
        if alert.is_active() {
            inner
                .active_alerts
                .insert((alert.location_id, alert.hazard), alert.id);
        }
        inner.alerts.insert(alert.id, alert);
    }

    #[must_use]
    pub fn alert(&self, id: Uuid) -> Option<Alert> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner.alerts.get(&id).cloned()
    }

    /// The active alert for (location, hazard), if one exists.
    #[must_use]
    pub fn active_alert(&self, location_id: Uuid, hazard: HazardKind) -> Option<Alert> {
        let inner = self.inner.read().expect("store lock poisoned");
        inner
            .active_alerts
            .get(&(location_id, hazard))
            .and_then(|id| inner.alerts.get(id))
            .cloned()
    }

    /// Alerts filtered by status (or all), newest first.
    #[must_use]
    pub fn alerts(&self, status: Option<AlertStatus>) -> Vec<Alert> {
        let inner = self.inner.read().expect("store lock poisoned");
        let mut all: Vec<Alert> = inner
            .alerts
            .values()
            .filter(|a| status.is_none_or(|s| a.status == s))
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }

    /// Apply a mutation to an alert and re-index the active-alert map.
    /// Returns the updated alert, or None when the id is unknown.
    pub fn update_alert<F>(&self, id: Uuid, mutate: F) -> Option<Alert>
    where
        F: FnOnce(&mut Alert),
    {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let alert = inner.alerts.get_mut(&id)?;
        mutate(alert);
        let updated = alert.clone();

        let key = (updated.location_id, updated.hazard);
        if updated.is_active() {
            inner.active_alerts.insert(key, id);
        } else if inner.active_alerts.get(&key) == Some(&id) {
            inner.active_alerts.remove(&key);
        }

        Some(updated)
    }

    // ---- cleanup ----

    /// Delete records older than their retention windows. Readings in the
    /// lineage of an unresolved alert's triggering assessment are kept, as
    /// are assessments referenced by any remaining alert.
    pub fn cleanup(
        &self,
        now: DateTime<Utc>,
        reading_retention: Duration,
        assessment_retention: Duration,
        alert_retention: Duration,
    ) -> CleanupStats {
        let mut inner = self.inner.write().expect("store lock poisoned");
        let mut stats = CleanupStats::default();

        // Terminal alerts past retention go first.
        let alert_cutoff = now - alert_retention;
        let expired: Vec<Uuid> = inner
            .alerts
            .values()
            .filter(|a| !a.is_active() && a.updated_at < alert_cutoff)
            .map(|a| a.id)
            .collect();
        for id in expired {
            inner.alerts.remove(&id);
            stats.alerts_deleted += 1;
        }

        // Lineage protection for whatever alerts remain.
        let protected_assessments: HashSet<Uuid> =
            inner.alerts.values().map(|a| a.assessment_id).collect();
        let protected_readings: HashSet<ReadingKey> = inner
            .alerts
            .values()
            .filter(|a| a.is_active())
            .filter_map(|a| inner.assessments.get(&a.assessment_id))
            .flat_map(|a| a.features.inputs.iter().cloned())
            .collect();

        let reading_cutoff = now - reading_retention;
        for by_ts in inner.readings.values_mut() {
            by_ts.retain(|ts, by_source| {
                if *ts >= reading_cutoff {
                    return true;
                }
                by_source.retain(|_, reading| {
                    let keep = protected_readings.contains(&reading.key());
                    if !keep {
                        stats.readings_deleted += 1;
                    }
                    keep
                });
                !by_source.is_empty()
            });
        }

        let assessment_cutoff = now - assessment_retention;
        let stale: Vec<Uuid> = inner
            .assessments
            .values()
            .filter(|a| a.computed_at < assessment_cutoff && !protected_assessments.contains(&a.id))
            .map(|a| a.id)
            .collect();
        for id in &stale {
            inner.assessments.remove(id);
            stats.assessments_deleted += 1;
        }
        if !stale.is_empty() {
            let stale_set: HashSet<Uuid> = stale.into_iter().collect();
            for history in inner.assessment_history.values_mut() {
                history.retain(|id| !stale_set.contains(id));
            }
        }

        stats
    }
}
