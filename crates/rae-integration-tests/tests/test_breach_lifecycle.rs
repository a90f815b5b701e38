//! Full breach lifecycle through the assembled engine: open, refresh,
//! escalate with provenance, de-escalate in place, resolve.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use rae_core::{
    AppetiteCategory, AppetiteLevel, BreachSeverity, BreachStatus, CategoryId, IndicatorId,
    MetricId, MetricKind, OrgId, RiskCategoryId, ThresholdBands, Timestamp, ToleranceMetric,
};
use rae_governance::AppetiteEngine;
use rae_ledger::LedgerOutcome;
use rae_store::{
    BreachStore, ConfigStore, IndicatorStore, MemoryStore, NotificationDispatcher,
    RecordingDispatcher,
};

fn ts(day: u32) -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 6, day, 0, 0, 0).unwrap())
}

struct Harness {
    store: Arc<MemoryStore>,
    dispatcher: Arc<RecordingDispatcher>,
    engine: AppetiteEngine,
    metric_id: MetricId,
}

/// One active MAXIMUM metric, amber above 80, red above 100.
fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let org = OrgId::new();
    let category = AppetiteCategory {
        id: CategoryId::new(),
        org_id: org,
        risk_category_id: RiskCategoryId::new("operational"),
        name: "Operational".to_string(),
        level: AppetiteLevel::Low,
    };
    let mut metric =
        ToleranceMetric::new(org, category.id, "operational loss", MetricKind::Maximum);
    metric.bands = ThresholdBands {
        amber_max: Some(80.0),
        red_max: Some(100.0),
        ..Default::default()
    };
    metric.indicator_id = Some(IndicatorId::new());
    metric.is_active = true;
    let metric_id = metric.id;
    store.insert_category(category);
    store.insert_metric(metric);

    let engine = AppetiteEngine::new(
        Arc::clone(&store) as Arc<dyn ConfigStore>,
        Arc::clone(&store) as Arc<dyn IndicatorStore>,
        Arc::clone(&store) as Arc<dyn BreachStore>,
        Arc::clone(&dispatcher) as Arc<dyn NotificationDispatcher>,
    );
    Harness {
        store,
        dispatcher,
        engine,
        metric_id,
    }
}

#[test]
fn repeated_identical_observations_leave_one_ledger_row() {
    let h = harness();

    h.engine.record_observation(&h.metric_id, 85.0, ts(1)).unwrap();
    let second = h.engine.record_observation(&h.metric_id, 85.0, ts(2)).unwrap();

    assert!(matches!(second, LedgerOutcome::Refreshed(_)));
    assert_eq!(h.store.breach_row_count(), 1);
    assert_eq!(h.dispatcher.notice_count(), 1);
}

#[test]
fn escalation_links_the_red_row_to_the_closed_amber_row() {
    let h = harness();

    h.engine.record_observation(&h.metric_id, 85.0, ts(1)).unwrap();
    let outcome = h.engine.record_observation(&h.metric_id, 130.0, ts(2)).unwrap();

    let LedgerOutcome::Escalated { closed, opened } = outcome else {
        panic!("expected escalation");
    };
    assert_eq!(opened.prior_breach_id, Some(closed));

    let amber = h.store.breach(&closed).unwrap();
    assert_eq!(amber.status, BreachStatus::Closed);
    assert_eq!(amber.resolution_note.as_deref(), Some("Escalated to RED"));

    // Never more than one open row per metric.
    let open = h.store.latest_open_breach(&h.metric_id).unwrap().unwrap();
    assert_eq!(open.id, opened.id);
    assert_eq!(open.severity, BreachSeverity::Red);
}

#[test]
fn de_escalation_keeps_a_single_entry_while_escalation_does_not() {
    let h = harness();

    // RED first, then back down to AMBER: one row mutated in place.
    h.engine.record_observation(&h.metric_id, 130.0, ts(1)).unwrap();
    h.engine.record_observation(&h.metric_id, 85.0, ts(2)).unwrap();
    assert_eq!(h.store.breach_row_count(), 1);
    let open = h.store.latest_open_breach(&h.metric_id).unwrap().unwrap();
    assert_eq!(open.severity, BreachSeverity::Amber);
    assert!(open.prior_breach_id.is_none());

    // Escalating back up closes and links: a second row appears.
    h.engine.record_observation(&h.metric_id, 130.0, ts(3)).unwrap();
    assert_eq!(h.store.breach_row_count(), 2);
}

#[test]
fn green_resolves_and_a_later_excursion_opens_fresh() {
    let h = harness();

    h.engine.record_observation(&h.metric_id, 85.0, ts(1)).unwrap();
    h.engine.record_observation(&h.metric_id, 40.0, ts(2)).unwrap();
    assert!(h.store.latest_open_breach(&h.metric_id).unwrap().is_none());

    let reopened = h.engine.record_observation(&h.metric_id, 90.0, ts(3)).unwrap();
    let LedgerOutcome::Opened(breach) = reopened else {
        panic!("expected a fresh breach");
    };
    // The new excursion starts a new chain.
    assert!(breach.prior_breach_id.is_none());
    assert_eq!(h.store.breach_row_count(), 2);
}

#[test]
fn escalation_notices_fire_on_open_and_escalate_only() {
    let h = harness();

    h.engine.record_observation(&h.metric_id, 85.0, ts(1)).unwrap(); // open → notice
    h.engine.record_observation(&h.metric_id, 86.0, ts(2)).unwrap(); // refresh → silent
    h.engine.record_observation(&h.metric_id, 130.0, ts(3)).unwrap(); // escalate → notice
    h.engine.record_observation(&h.metric_id, 90.0, ts(4)).unwrap(); // de-escalate → silent
    h.engine.record_observation(&h.metric_id, 40.0, ts(5)).unwrap(); // resolve → silent

    let notices = h.dispatcher.notices();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices[0].severity, BreachSeverity::Amber);
    assert_eq!(notices[1].severity, BreachSeverity::Red);
}
