//! Batch sweep across crates: parallel fan-out feeding the real
//! tracker, cooperative cancellation, and notification failures that
//! never roll back ledger writes.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use rae_core::{
    AppetiteCategory, AppetiteLevel, CategoryId, IndicatorId, IndicatorObservation, MetricKind,
    OrgId, RiskCategoryId, ThresholdBands, Timestamp, ToleranceMetric,
};
use rae_governance::{AppetiteEngine, CancelFlag};
use rae_store::{
    BreachStore, ConfigStore, FailingDispatcher, IndicatorStore, MemoryStore,
    NotificationDispatcher, RecordingDispatcher,
};

fn ts(y: i32, m: u32, d: u32) -> Timestamp {
    Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

fn engine_with(store: &Arc<MemoryStore>, dispatcher: Arc<dyn NotificationDispatcher>) -> AppetiteEngine {
    AppetiteEngine::new(
        Arc::clone(store) as Arc<dyn ConfigStore>,
        Arc::clone(store) as Arc<dyn IndicatorStore>,
        Arc::clone(store) as Arc<dyn BreachStore>,
        dispatcher,
    )
}

/// Seed `n` active MAXIMUM metrics (amber 80, red 100) observing `value`.
fn seed_metrics(store: &MemoryStore, org: OrgId, n: usize, value: f64) {
    let category = AppetiteCategory {
        id: CategoryId::new(),
        org_id: org,
        risk_category_id: RiskCategoryId::new("operational"),
        name: "Operational".to_string(),
        level: AppetiteLevel::Low,
    };
    let category_id = category.id;
    store.insert_category(category);
    for i in 0..n {
        let indicator = IndicatorId::new();
        let mut metric =
            ToleranceMetric::new(org, category_id, format!("metric {i}"), MetricKind::Maximum);
        metric.bands = ThresholdBands {
            amber_max: Some(80.0),
            red_max: Some(100.0),
            ..Default::default()
        };
        metric.indicator_id = Some(indicator);
        metric.is_active = true;
        store.insert_metric(metric);
        store.push_observation(IndicatorObservation {
            indicator_id: indicator,
            value,
            observed_at: ts(2026, 5, 30),
        });
    }
}

#[test]
fn parallel_sweep_opens_one_breach_per_breaching_metric() {
    let store = Arc::new(MemoryStore::new());
    let org = OrgId::new();
    seed_metrics(&store, org, 16, 85.0);
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let engine = engine_with(&store, Arc::clone(&dispatcher) as Arc<dyn NotificationDispatcher>);

    let report = engine
        .sweep(&org, ts(2026, 6, 1), &CancelFlag::new(), 4)
        .unwrap();
    assert_eq!(report.evaluated, 16);
    assert_eq!(report.breaches_recorded, 16);
    assert_eq!(store.breach_row_count(), 16);
    assert_eq!(dispatcher.notice_count(), 16);
}

#[test]
fn second_sweep_refreshes_instead_of_duplicating() {
    let store = Arc::new(MemoryStore::new());
    let org = OrgId::new();
    seed_metrics(&store, org, 8, 85.0);
    let engine = engine_with(&store, Arc::new(RecordingDispatcher::new()));

    engine.sweep(&org, ts(2026, 6, 1), &CancelFlag::new(), 4).unwrap();
    let second = engine.sweep(&org, ts(2026, 6, 2), &CancelFlag::new(), 4).unwrap();

    assert_eq!(second.evaluated, 8);
    assert_eq!(second.breaches_recorded, 0);
    assert_eq!(store.breach_row_count(), 8);
}

#[test]
fn pre_cancelled_sweep_touches_nothing() {
    let store = Arc::new(MemoryStore::new());
    let org = OrgId::new();
    seed_metrics(&store, org, 10, 85.0);
    let engine = engine_with(&store, Arc::new(RecordingDispatcher::new()));

    let cancel = CancelFlag::new();
    cancel.cancel();
    let report = engine.sweep(&org, ts(2026, 6, 1), &cancel, 4).unwrap();
    assert_eq!(report.evaluated, 0);
    assert_eq!(report.skipped, 10);
    assert_eq!(store.breach_row_count(), 0);
}

#[test]
fn cancel_flag_clones_share_state() {
    let flag = CancelFlag::new();
    let shared = flag.clone();
    assert!(!shared.is_cancelled());
    flag.cancel();
    assert!(shared.is_cancelled());
}

#[test]
fn failing_dispatcher_never_blocks_ledger_writes() {
    let store = Arc::new(MemoryStore::new());
    let org = OrgId::new();
    seed_metrics(&store, org, 5, 130.0);
    let engine = engine_with(&store, Arc::new(FailingDispatcher));

    let report = engine
        .sweep(&org, ts(2026, 6, 1), &CancelFlag::new(), 2)
        .unwrap();
    // Every breach lands despite every notification failing.
    assert_eq!(report.breaches_recorded, 5);
    assert_eq!(report.counts.red, 5);
    assert_eq!(store.breach_row_count(), 5);
}
