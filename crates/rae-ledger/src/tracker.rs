//! # Breach Tracker
//!
//! The only writer of the breach ledger. For each observation it takes
//! the per-metric lock, loads the open-like breach, asks the planner for
//! the one defined action, and applies it to the [`BreachStore`].
//!
//! ## Idempotence
//!
//! Repeating an observation with the same (metric, status, value) is a
//! Refresh: the existing row's observed value and timestamp move, no row
//! is inserted, no notification is re-fired. Upstream delivery is
//! at-least-once; the tracker absorbs the duplicates.
//!
//! ## Serialization
//!
//! Concurrent observations of different metrics proceed in parallel;
//! observations of the same metric queue on a `parking_lot` mutex held
//! across the full read-modify-write. Lock map entries are removed once
//! the last holder releases them, so the map stays bounded by concurrent
//! observations rather than growing per metric ever seen. The store's
//! open-like conflict check remains the backstop across service
//! instances.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rae_core::{
    AppetiteBreach, BreachId, BreachSeverity, BreachStatus, MetricId, StoreError, Timestamp,
    ToleranceMetric,
};
use rae_engine::ThresholdEvaluationResult;
use rae_store::{BreachStore, EscalationNotice, NotificationDispatcher};

use crate::planner::{plan, LedgerAction};

/// Failure while applying a planned ledger action.
#[derive(Error, Debug)]
pub enum TrackerError {
    /// The breach store refused or failed a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the tracker did to the ledger for one observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOutcome {
    /// The ledger was not touched.
    NoChange,
    /// A new breach was opened.
    Opened(AppetiteBreach),
    /// The existing open-like row was refreshed in place.
    Refreshed(AppetiteBreach),
    /// The open-like breach was resolved.
    Resolved(AppetiteBreach),
    /// The AMBER row was closed and a linked RED row opened.
    Escalated {
        /// The now-CLOSED amber row.
        closed: BreachId,
        /// The new RED row; its `prior_breach_id` is `closed`.
        opened: AppetiteBreach,
    },
    /// The RED row was mutated down to AMBER in place.
    DeEscalated(AppetiteBreach),
}

impl LedgerOutcome {
    /// The open-like ledger row after this outcome, if one exists.
    pub fn open_breach(&self) -> Option<&AppetiteBreach> {
        match self {
            Self::NoChange | Self::Resolved(_) => None,
            Self::Opened(b) | Self::Refreshed(b) | Self::DeEscalated(b) => Some(b),
            Self::Escalated { opened, .. } => Some(opened),
        }
    }
}

/// Idempotent breach ledger writer with per-metric serialization.
pub struct BreachTracker {
    breaches: Arc<dyn BreachStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    locks: Mutex<HashMap<MetricId, Arc<Mutex<()>>>>,
}

impl BreachTracker {
    /// Create a tracker over the given ledger store and dispatcher.
    pub fn new(breaches: Arc<dyn BreachStore>, dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self {
            breaches,
            dispatcher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn metric_lock(&self, metric_id: &MetricId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(*metric_id).or_default())
    }

    /// Drop the map entry once no caller holds the lock any more, so the
    /// map does not grow one entry per metric ever observed.
    fn prune_metric_lock(&self, metric_id: &MetricId) {
        let mut locks = self.locks.lock();
        if let Some(entry) = locks.get(metric_id) {
            // strong_count == 1 means the map holds the only reference:
            // no caller is waiting on or using this lock.
            if Arc::strong_count(entry) == 1 {
                locks.remove(metric_id);
            }
        }
    }

    /// Record one evaluated observation against the ledger.
    ///
    /// GREEN resolves any open-like breach; UNKNOWN is a no-op; AMBER and
    /// RED open, refresh, escalate, or de-escalate per the planner.
    /// Notifications fire only when a row is opened or escalated, and
    /// dispatch failure never rolls back the ledger write.
    pub fn record_observation(
        &self,
        metric: &ToleranceMetric,
        verdict: &ThresholdEvaluationResult,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, TrackerError> {
        let lock = self.metric_lock(&metric.id);
        let outcome = {
            let _guard = lock.lock();
            self.apply_observation(metric, verdict, observed_at)
        };
        drop(lock);
        self.prune_metric_lock(&metric.id);
        outcome
    }

    fn apply_observation(
        &self,
        metric: &ToleranceMetric,
        verdict: &ThresholdEvaluationResult,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, TrackerError> {
        let existing = self.breaches.latest_open_breach(&metric.id)?;
        let action = plan(existing.as_ref().map(|b| b.severity), verdict.status);
        tracing::debug!(
            metric_id = %metric.id,
            status = %verdict.status,
            action = ?action,
            "ledger action planned"
        );

        let outcome = match action {
            LedgerAction::NoOp => LedgerOutcome::NoChange,
            LedgerAction::Resolve => match existing {
                Some(breach) => self.resolve(breach, observed_at)?,
                None => LedgerOutcome::NoChange,
            },
            LedgerAction::OpenNew(severity) => {
                let breach = self.open(metric, severity, verdict, observed_at)?;
                self.dispatch(metric, severity);
                LedgerOutcome::Opened(breach)
            }
            LedgerAction::Refresh => match existing {
                Some(breach) => self.refresh(breach, verdict, observed_at)?,
                None => LedgerOutcome::NoChange,
            },
            LedgerAction::Escalate => match existing {
                Some(amber) => {
                    let outcome = self.escalate(metric, amber, verdict, observed_at)?;
                    self.dispatch(metric, BreachSeverity::Red);
                    outcome
                }
                None => LedgerOutcome::NoChange,
            },
            LedgerAction::DeEscalateInPlace => match existing {
                Some(red) => self.de_escalate(red, verdict, observed_at)?,
                None => LedgerOutcome::NoChange,
            },
        };
        Ok(outcome)
    }

    fn open(
        &self,
        metric: &ToleranceMetric,
        severity: BreachSeverity,
        verdict: &ThresholdEvaluationResult,
        observed_at: Timestamp,
    ) -> Result<AppetiteBreach, TrackerError> {
        // Breach verdicts carry the crossed bound; fall back to the
        // observed value if an upstream evaluator omitted it.
        let threshold = verdict.threshold_value.unwrap_or(verdict.observed_value);
        let breach = AppetiteBreach::open(
            metric.org_id,
            metric.id,
            metric.indicator_id,
            severity,
            verdict.observed_value,
            threshold,
            observed_at,
        );
        self.breaches.insert_breach(&breach)?;
        tracing::info!(
            metric_id = %metric.id,
            breach_id = %breach.id,
            severity = %severity,
            observed_value = verdict.observed_value,
            "breach opened"
        );
        Ok(breach)
    }

    fn refresh(
        &self,
        mut breach: AppetiteBreach,
        verdict: &ThresholdEvaluationResult,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, TrackerError> {
        breach.observed_value = verdict.observed_value;
        breach.last_observed_at = observed_at;
        self.breaches.update_breach(&breach)?;
        Ok(LedgerOutcome::Refreshed(breach))
    }

    fn resolve(
        &self,
        mut breach: AppetiteBreach,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, TrackerError> {
        breach.status = BreachStatus::Resolved;
        breach.resolved_at = Some(observed_at);
        breach.last_observed_at = observed_at;
        breach.resolution_note = Some("Returned inside tolerance".to_string());
        self.breaches.update_breach(&breach)?;
        tracing::info!(
            metric_id = %breach.metric_id,
            breach_id = %breach.id,
            "breach resolved"
        );
        Ok(LedgerOutcome::Resolved(breach))
    }

    fn escalate(
        &self,
        metric: &ToleranceMetric,
        mut amber: AppetiteBreach,
        verdict: &ThresholdEvaluationResult,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, TrackerError> {
        // Close the amber row before inserting, or the store's open-like
        // conflict backstop would refuse the new row.
        amber.status = BreachStatus::Closed;
        amber.resolved_at = Some(observed_at);
        amber.resolution_note = Some("Escalated to RED".to_string());
        self.breaches.update_breach(&amber)?;

        let threshold = verdict.threshold_value.unwrap_or(verdict.observed_value);
        let mut red = AppetiteBreach::open(
            metric.org_id,
            metric.id,
            metric.indicator_id,
            BreachSeverity::Red,
            verdict.observed_value,
            threshold,
            observed_at,
        );
        red.prior_breach_id = Some(amber.id);
        self.breaches.insert_breach(&red)?;
        tracing::warn!(
            metric_id = %metric.id,
            closed_breach_id = %amber.id,
            breach_id = %red.id,
            observed_value = verdict.observed_value,
            "breach escalated to RED"
        );
        Ok(LedgerOutcome::Escalated {
            closed: amber.id,
            opened: red,
        })
    }

    fn de_escalate(
        &self,
        mut red: AppetiteBreach,
        verdict: &ThresholdEvaluationResult,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, TrackerError> {
        red.severity = BreachSeverity::Amber;
        red.observed_value = verdict.observed_value;
        if let Some(threshold) = verdict.threshold_value {
            red.threshold_value = threshold;
        }
        red.last_observed_at = observed_at;
        self.breaches.update_breach(&red)?;
        tracing::info!(
            metric_id = %red.metric_id,
            breach_id = %red.id,
            "breach de-escalated to AMBER in place"
        );
        Ok(LedgerOutcome::DeEscalated(red))
    }

    fn dispatch(&self, metric: &ToleranceMetric, severity: BreachSeverity) {
        let notice = notice_for(metric, severity);
        if let Err(err) = self.dispatcher.notify(&notice) {
            tracing::warn!(
                metric_id = %metric.id,
                severity = %severity,
                error = %err,
                "escalation notice dropped"
            );
        }
    }
}

/// Escalation routing per severity: AMBER goes to the metric owner and
/// risk committee on a 30-day SLA; RED adds the CRO and board committee
/// on a 7-day SLA.
fn notice_for(metric: &ToleranceMetric, severity: BreachSeverity) -> EscalationNotice {
    match severity {
        BreachSeverity::Amber => EscalationNotice {
            org_id: metric.org_id,
            metric_id: metric.id,
            severity,
            recipients: vec!["metric_owner".to_string(), "risk_committee".to_string()],
            sla_days: 30,
            action_required: "Remediation plan required".to_string(),
        },
        BreachSeverity::Red => EscalationNotice {
            org_id: metric.org_id,
            metric_id: metric.id,
            severity,
            recipients: vec![
                "metric_owner".to_string(),
                "chief_risk_officer".to_string(),
                "board_risk_committee".to_string(),
            ],
            sla_days: 7,
            action_required: "Immediate remediation and board notification required".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rae_core::{CategoryId, MetricKind, OrgId, RagStatus, ThresholdBands};
    use rae_store::{MemoryStore, RecordingDispatcher};

    fn ts(day: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 6, day, 0, 0, 0).unwrap())
    }

    fn metric() -> ToleranceMetric {
        let mut m = ToleranceMetric::new(
            OrgId::new(),
            CategoryId::new(),
            "incident rate",
            MetricKind::Maximum,
        );
        m.bands = ThresholdBands {
            amber_max: Some(80.0),
            red_max: Some(100.0),
            ..Default::default()
        };
        m.is_active = true;
        m
    }

    fn verdict(status: RagStatus, observed: f64, threshold: Option<f64>) -> ThresholdEvaluationResult {
        ThresholdEvaluationResult {
            status,
            threshold: "80 to 100".to_string(),
            explanation: "test verdict".to_string(),
            observed_value: observed,
            threshold_value: threshold,
            change_pct: None,
        }
    }

    fn tracker() -> (Arc<MemoryStore>, Arc<RecordingDispatcher>, BreachTracker) {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let tracker = BreachTracker::new(
            Arc::clone(&store) as Arc<dyn BreachStore>,
            Arc::clone(&dispatcher) as Arc<dyn NotificationDispatcher>,
        );
        (store, dispatcher, tracker)
    }

    #[test]
    fn amber_observation_opens_one_breach_and_notifies() {
        let (store, dispatcher, tracker) = tracker();
        let m = metric();

        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(1))
            .unwrap();
        let breach = outcome.open_breach().unwrap();
        assert_eq!(breach.severity, BreachSeverity::Amber);
        assert_eq!(breach.status, BreachStatus::Open);
        assert_eq!(breach.threshold_value, 80.0);
        assert_eq!(store.breach_row_count(), 1);
        assert_eq!(dispatcher.notice_count(), 1);
        assert_eq!(dispatcher.notices()[0].sla_days, 30);
    }

    #[test]
    fn identical_repeat_is_a_refresh_not_an_insert() {
        let (store, dispatcher, tracker) = tracker();
        let m = metric();
        let v = verdict(RagStatus::Amber, 85.0, Some(80.0));

        tracker.record_observation(&m, &v, ts(1)).unwrap();
        let outcome = tracker.record_observation(&m, &v, ts(2)).unwrap();

        assert!(matches!(outcome, LedgerOutcome::Refreshed(_)));
        assert_eq!(store.breach_row_count(), 1);
        // Refresh does not re-fire the escalation.
        assert_eq!(dispatcher.notice_count(), 1);
        let open = store.latest_open_breach(&m.id).unwrap().unwrap();
        assert_eq!(open.last_observed_at, ts(2));
    }

    #[test]
    fn green_resolves_the_open_breach() {
        let (store, _, tracker) = tracker();
        let m = metric();

        tracker
            .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(1))
            .unwrap();
        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Green, 50.0, None), ts(2))
            .unwrap();

        let LedgerOutcome::Resolved(resolved) = outcome else {
            panic!("expected resolution");
        };
        assert_eq!(resolved.status, BreachStatus::Resolved);
        assert_eq!(resolved.resolved_at, Some(ts(2)));
        assert!(store.latest_open_breach(&m.id).unwrap().is_none());
    }

    #[test]
    fn green_with_no_open_breach_is_a_no_op() {
        let (store, dispatcher, tracker) = tracker();
        let m = metric();
        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Green, 50.0, None), ts(1))
            .unwrap();
        assert!(matches!(outcome, LedgerOutcome::NoChange));
        assert_eq!(store.breach_row_count(), 0);
        assert_eq!(dispatcher.notice_count(), 0);
    }

    #[test]
    fn unknown_never_touches_the_ledger() {
        let (store, _, tracker) = tracker();
        let m = metric();
        tracker
            .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(1))
            .unwrap();
        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Unknown, 0.0, None), ts(2))
            .unwrap();
        assert!(matches!(outcome, LedgerOutcome::NoChange));
        let open = store.latest_open_breach(&m.id).unwrap().unwrap();
        assert_eq!(open.last_observed_at, ts(1));
    }

    #[test]
    fn escalation_closes_amber_and_links_the_red_row() {
        let (store, dispatcher, tracker) = tracker();
        let m = metric();

        tracker
            .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(1))
            .unwrap();
        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Red, 110.0, Some(100.0)), ts(2))
            .unwrap();

        let LedgerOutcome::Escalated { closed, opened } = outcome else {
            panic!("expected escalation");
        };
        assert_eq!(opened.prior_breach_id, Some(closed));
        assert_eq!(opened.severity, BreachSeverity::Red);
        assert_eq!(opened.threshold_value, 100.0);

        let amber = store.breach(&closed).unwrap();
        assert_eq!(amber.status, BreachStatus::Closed);
        assert_eq!(amber.resolution_note.as_deref(), Some("Escalated to RED"));

        // Exactly one open row survives the escalation.
        assert_eq!(store.breach_row_count(), 2);
        let open = store.latest_open_breach(&m.id).unwrap().unwrap();
        assert_eq!(open.id, opened.id);

        assert_eq!(dispatcher.notice_count(), 2);
        assert_eq!(dispatcher.notices()[1].severity, BreachSeverity::Red);
        assert_eq!(dispatcher.notices()[1].sla_days, 7);
    }

    #[test]
    fn de_escalation_mutates_the_red_row_in_place() {
        let (store, dispatcher, tracker) = tracker();
        let m = metric();

        tracker
            .record_observation(&m, &verdict(RagStatus::Red, 110.0, Some(100.0)), ts(1))
            .unwrap();
        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(2))
            .unwrap();

        let LedgerOutcome::DeEscalated(breach) = outcome else {
            panic!("expected in-place de-escalation");
        };
        assert_eq!(breach.severity, BreachSeverity::Amber);
        assert_eq!(breach.observed_value, 85.0);
        assert_eq!(breach.threshold_value, 80.0);
        // Single ledger entry, no provenance link, no new notification.
        assert_eq!(store.breach_row_count(), 1);
        assert!(breach.prior_breach_id.is_none());
        assert_eq!(dispatcher.notice_count(), 1);
    }

    #[test]
    fn lock_map_does_not_grow_per_metric_observed() {
        let (_, _, tracker) = tracker();
        for _ in 0..16 {
            let m = metric();
            tracker
                .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(1))
                .unwrap();
            tracker
                .record_observation(&m, &verdict(RagStatus::Green, 50.0, None), ts(2))
                .unwrap();
        }
        assert!(tracker.locks.lock().is_empty());
    }

    #[test]
    fn dispatch_failure_does_not_roll_back_the_ledger() {
        let store = Arc::new(MemoryStore::new());
        let tracker = BreachTracker::new(
            Arc::clone(&store) as Arc<dyn BreachStore>,
            Arc::new(rae_store::FailingDispatcher) as Arc<dyn NotificationDispatcher>,
        );
        let m = metric();

        let outcome = tracker
            .record_observation(&m, &verdict(RagStatus::Amber, 85.0, Some(80.0)), ts(1))
            .unwrap();
        assert!(outcome.open_breach().is_some());
        assert_eq!(store.breach_row_count(), 1);
    }
}
