//! Alert state machine tests: deduplication, cooldown semantics, terminal
//! transitions, and the auto-resolve configuration hook.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use coastwatch::alert::{AlertManager, AlertOutcome, AlertPolicy};
use coastwatch::domain::{
    Alert, AlertSeverity, AlertStatus, FeatureVector, Location, RiskAssessment, RiskLevel,
};
use coastwatch::error::AppError;
use coastwatch::store::MonitorStore;

fn policy() -> AlertPolicy {
    AlertPolicy {
        threshold: RiskLevel::High,
        cooldown: Duration::minutes(30),
        auto_resolve: false,
    }
}

fn test_location(store: &MonitorStore) -> Location {
    let location = Location {
        id: Uuid::new_v4(),
        name: "Key West".to_string(),
        latitude: 24.55,
        longitude: -81.80,
        station_ids: Default::default(),
        description: String::new(),
        is_active: true,
    };
    store.upsert_location(location.clone());
    location
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()
}

/// Assessment whose features indicate coastal flooding (water level > 5 m).
fn flooding_assessment(
    location_id: Uuid,
    score: f64,
    level: RiskLevel,
    at: DateTime<Utc>,
) -> RiskAssessment {
    let mut features = FeatureVector::new(location_id, at);
    features.set("water_level", 6.0);
    features.set("wave_height", 3.2);
    features.set("wind_speed", 18.0);

    RiskAssessment {
        id: Uuid::new_v4(),
        location_id,
        score,
        level,
        model_version: "test-v1".to_string(),
        features,
        computed_at: at,
    }
}

fn active_alerts(store: &MonitorStore) -> Vec<Alert> {
    store.alerts(Some(AlertStatus::Active))
}

#[tokio::test]
async fn consecutive_triggers_within_cooldown_produce_one_alert() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(store.clone(), policy());

    let first = flooding_assessment(location.id, 0.82, RiskLevel::Critical, start());
    let outcome = manager.evaluate(&first).await;
    assert!(matches!(outcome, AlertOutcome::Created(_)));

    let second = flooding_assessment(
        location.id,
        0.85,
        RiskLevel::Critical,
        start() + Duration::minutes(10),
    );
    let AlertOutcome::Updated(updated) = manager.evaluate(&second).await else {
        panic!("expected update");
    };

    assert_eq!(active_alerts(&store).len(), 1);
    assert_eq!(updated.assessment_id, second.id);
    assert_eq!(updated.updated_at, second.computed_at);
}

#[tokio::test]
async fn severity_upgrades_within_cooldown_but_never_downgrades() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(store.clone(), policy());

    let high = flooding_assessment(location.id, 0.65, RiskLevel::High, start());
    let AlertOutcome::Created(alert) = manager.evaluate(&high).await else {
        panic!("expected creation");
    };
    assert_eq!(alert.severity, AlertSeverity::Urgent);

    // Escalation inside the cooldown upgrades severity.
    let critical = flooding_assessment(
        location.id,
        0.9,
        RiskLevel::Critical,
        start() + Duration::minutes(5),
    );
    let AlertOutcome::Updated(alert) = manager.evaluate(&critical).await else {
        panic!("expected update");
    };
    assert_eq!(alert.severity, AlertSeverity::Critical);

    // A weaker trigger inside the cooldown leaves severity alone.
    let weaker = flooding_assessment(
        location.id,
        0.65,
        RiskLevel::High,
        start() + Duration::minutes(10),
    );
    let AlertOutcome::Updated(alert) = manager.evaluate(&weaker).await else {
        panic!("expected update");
    };
    assert_eq!(alert.severity, AlertSeverity::Critical);

    // Once the cooldown has elapsed, severity tracks the new level.
    let later = flooding_assessment(
        location.id,
        0.65,
        RiskLevel::High,
        start() + Duration::minutes(50),
    );
    let AlertOutcome::Updated(alert) = manager.evaluate(&later).await else {
        panic!("expected update");
    };
    assert_eq!(alert.severity, AlertSeverity::Urgent);
}

#[tokio::test]
async fn resolving_twice_is_idempotent() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(store.clone(), policy());

    let assessment = flooding_assessment(location.id, 0.82, RiskLevel::Critical, start());
    let AlertOutcome::Created(alert) = manager.evaluate(&assessment).await else {
        panic!("expected creation");
    };

    let resolved = manager.resolve(alert.id, "duty-officer").await.expect("resolves");
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.resolved_by.as_deref(), Some("duty-officer"));
    let first_resolved_at = resolved.resolved_at.expect("timestamp recorded");

    // Second resolve succeeds and changes nothing.
    let again = manager.resolve(alert.id, "someone-else").await.expect("no-op");
    assert_eq!(again.resolved_at, Some(first_resolved_at));
    assert_eq!(again.resolved_by.as_deref(), Some("duty-officer"));
}

#[tokio::test]
async fn terminal_states_are_exclusive_per_episode() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(store.clone(), policy());

    let assessment = flooding_assessment(location.id, 0.82, RiskLevel::Critical, start());
    let AlertOutcome::Created(alert) = manager.evaluate(&assessment).await else {
        panic!("expected creation");
    };

    manager.dismiss(alert.id, "duty-officer").await.expect("dismisses");
    let result = manager.resolve(alert.id, "duty-officer").await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    // A later trigger starts a fresh episode.
    let next = flooding_assessment(
        location.id,
        0.82,
        RiskLevel::Critical,
        start() + Duration::hours(2),
    );
    let outcome = manager.evaluate(&next).await;
    assert!(matches!(outcome, AlertOutcome::Created(_)));
    assert_eq!(active_alerts(&store).len(), 1);
}

#[tokio::test]
async fn below_threshold_does_not_auto_resolve_by_default() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(store.clone(), policy());

    let trigger = flooding_assessment(location.id, 0.82, RiskLevel::Critical, start());
    manager.evaluate(&trigger).await;

    let calm = flooding_assessment(
        location.id,
        0.2,
        RiskLevel::Low,
        start() + Duration::minutes(15),
    );
    let outcome = manager.evaluate(&calm).await;
    assert_eq!(outcome, AlertOutcome::NoAction);

    // Stale alert stays active until explicitly resolved.
    assert_eq!(active_alerts(&store).len(), 1);
}

#[tokio::test]
async fn below_threshold_resolves_when_auto_resolve_is_enabled() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(
        store.clone(),
        AlertPolicy {
            auto_resolve: true,
            ..policy()
        },
    );

    let trigger = flooding_assessment(location.id, 0.82, RiskLevel::Critical, start());
    manager.evaluate(&trigger).await;

    let calm = flooding_assessment(
        location.id,
        0.2,
        RiskLevel::Low,
        start() + Duration::minutes(15),
    );
    let AlertOutcome::AutoResolved(resolved) = manager.evaluate(&calm).await else {
        panic!("expected auto-resolution");
    };

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].status, AlertStatus::Resolved);
    assert_eq!(resolved[0].resolved_by.as_deref(), Some("system"));
    assert!(active_alerts(&store).is_empty());
}

#[tokio::test]
async fn below_threshold_without_active_alert_creates_nothing() {
    let store = Arc::new(MonitorStore::new());
    let location = test_location(&store);
    let manager = AlertManager::new(store.clone(), policy());

    let calm = flooding_assessment(location.id, 0.2, RiskLevel::Low, start());
    let outcome = manager.evaluate(&calm).await;

    assert_eq!(outcome, AlertOutcome::NoAction);
    assert!(store.alerts(None).is_empty());
}
