//! # Engine Facade
//!
//! [`AppetiteEngine`] wires the evaluator, aggregator, tracker,
//! validator, and gate over shared store handles and exposes the
//! operations an API layer or dashboard consumes. The facade owns no
//! business logic of its own; each operation delegates to the component
//! that does.

use std::sync::Arc;

use thiserror::Error;

use rae_core::{
    ActorId, AppetiteStatement, CategoryId, MetricId, OrgId, RagStatus, StatementId, StoreError,
    Timestamp, ToleranceMetric,
};
use rae_engine::{
    evaluate, CategoryAppetiteStatus, EnterpriseAppetiteStatus, EvaluationError, StatusAggregator,
    ThresholdEvaluationResult,
};
use rae_ledger::{BreachTracker, LedgerOutcome, TrackerError};
use rae_store::{BreachStore, ConfigStore, IndicatorStore, NotificationDispatcher};

use crate::approval::{ApprovalGate, GovernanceError};
use crate::validator::{ChainValidationResult, ChainValidator};

/// Failure of a facade operation; wraps the component errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Threshold evaluation failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The breach tracker failed.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// A governance operation was refused or failed.
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    /// Persistence layer failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The assembled Risk Appetite Engine.
pub struct AppetiteEngine {
    pub(crate) config: Arc<dyn ConfigStore>,
    pub(crate) indicators: Arc<dyn IndicatorStore>,
    pub(crate) tracker: BreachTracker,
}

impl AppetiteEngine {
    /// Assemble the engine over its four collaborators.
    pub fn new(
        config: Arc<dyn ConfigStore>,
        indicators: Arc<dyn IndicatorStore>,
        breaches: Arc<dyn BreachStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            config,
            indicators,
            tracker: BreachTracker::new(breaches, dispatcher),
        }
    }

    /// Evaluate a metric against its latest indicator value.
    ///
    /// A metric with no linked indicator or no observations evaluates to
    /// UNKNOWN rather than erroring; absence of data is routine.
    pub fn evaluate_metric(
        &self,
        metric_id: &MetricId,
        now: Timestamp,
    ) -> Result<ThresholdEvaluationResult, EngineError> {
        let metric = self.config.metric(metric_id)?;
        let Some(indicator_id) = metric.indicator_id else {
            return Ok(unknown_verdict("no indicator linked"));
        };
        let Some(latest) = self.indicators.latest_value(&indicator_id)? else {
            return Ok(unknown_verdict("no observations recorded"));
        };
        Ok(evaluate(&metric, latest.value, &*self.indicators, now)?)
    }

    /// Evaluate a supplied observation and record the outcome against
    /// the breach ledger.
    pub fn record_observation(
        &self,
        metric_id: &MetricId,
        value: f64,
        observed_at: Timestamp,
    ) -> Result<LedgerOutcome, EngineError> {
        let metric = self.config.metric(metric_id)?;
        let verdict = evaluate(&metric, value, &*self.indicators, observed_at)?;
        let outcome = self.tracker.record_observation(&metric, &verdict, observed_at)?;
        Ok(outcome)
    }

    /// Current roll-up for one appetite category.
    pub fn category_status(
        &self,
        category_id: &CategoryId,
        now: Timestamp,
    ) -> Result<CategoryAppetiteStatus, EngineError> {
        let aggregator = StatusAggregator::new(&*self.config, &*self.indicators);
        Ok(aggregator.category_status(category_id, now)?)
    }

    /// Current enterprise-wide roll-up.
    pub fn enterprise_status(
        &self,
        org_id: &OrgId,
        now: Timestamp,
    ) -> Result<EnterpriseAppetiteStatus, EngineError> {
        let aggregator = StatusAggregator::new(&*self.config, &*self.indicators);
        Ok(aggregator.enterprise_status(org_id, now)?)
    }

    /// Run the chain validator for an organization.
    pub fn validate_chain(
        &self,
        org_id: &OrgId,
        now: Timestamp,
    ) -> Result<ChainValidationResult, EngineError> {
        let validator = ChainValidator::new(&*self.config, &*self.indicators);
        Ok(validator.validate_chain(org_id, now)?)
    }

    /// Approve a draft appetite statement through the gate.
    pub fn approve_statement(
        &self,
        statement_id: &StatementId,
        approver: ActorId,
        now: Timestamp,
    ) -> Result<AppetiteStatement, EngineError> {
        let gate = ApprovalGate::new(&*self.config, &*self.indicators);
        Ok(gate.approve_statement(statement_id, approver, now)?)
    }

    /// Activate a tolerance metric through the gate.
    pub fn activate_metric(
        &self,
        metric_id: &MetricId,
        activator: ActorId,
        now: Timestamp,
    ) -> Result<ToleranceMetric, EngineError> {
        let gate = ApprovalGate::new(&*self.config, &*self.indicators);
        Ok(gate.activate_metric(metric_id, activator, now)?)
    }
}

fn unknown_verdict(reason: &str) -> ThresholdEvaluationResult {
    ThresholdEvaluationResult {
        status: RagStatus::Unknown,
        threshold: "none".to_string(),
        explanation: reason.to_string(),
        observed_value: 0.0,
        threshold_value: None,
        change_pct: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rae_core::{
        AppetiteCategory, AppetiteLevel, BreachSeverity, IndicatorId, IndicatorObservation,
        MetricKind, RiskCategoryId, ThresholdBands,
    };
    use rae_store::{MemoryStore, RecordingDispatcher};

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    fn engine(store: &Arc<MemoryStore>) -> AppetiteEngine {
        AppetiteEngine::new(
            Arc::clone(store) as Arc<dyn ConfigStore>,
            Arc::clone(store) as Arc<dyn IndicatorStore>,
            Arc::clone(store) as Arc<dyn BreachStore>,
            Arc::new(RecordingDispatcher::new()) as Arc<dyn NotificationDispatcher>,
        )
    }

    fn seed_maximum_metric(store: &MemoryStore, org: OrgId) -> (CategoryId, MetricId, IndicatorId) {
        let category = AppetiteCategory {
            id: CategoryId::new(),
            org_id: org,
            risk_category_id: RiskCategoryId::new("operational"),
            name: "Operational".to_string(),
            level: AppetiteLevel::Low,
        };
        let category_id = category.id;
        let indicator = IndicatorId::new();
        let mut metric = ToleranceMetric::new(org, category_id, "loss events", MetricKind::Maximum);
        metric.bands = ThresholdBands {
            amber_max: Some(80.0),
            red_max: Some(100.0),
            ..Default::default()
        };
        metric.indicator_id = Some(indicator);
        metric.is_active = true;
        let metric_id = metric.id;
        store.insert_category(category);
        store.insert_metric(metric);
        (category_id, metric_id, indicator)
    }

    #[test]
    fn evaluate_metric_uses_the_latest_observation() {
        let store = Arc::new(MemoryStore::new());
        let org = OrgId::new();
        let (_, metric_id, indicator) = seed_maximum_metric(&store, org);
        store.push_observation(IndicatorObservation {
            indicator_id: indicator,
            value: 85.0,
            observed_at: ts(2026, 5, 30),
        });

        let verdict = engine(&store)
            .evaluate_metric(&metric_id, ts(2026, 6, 1))
            .unwrap();
        assert_eq!(verdict.status, RagStatus::Amber);
        assert_eq!(verdict.threshold, "80 to 100");
    }

    #[test]
    fn evaluate_metric_without_data_is_unknown() {
        let store = Arc::new(MemoryStore::new());
        let org = OrgId::new();
        let (_, metric_id, _) = seed_maximum_metric(&store, org);

        let verdict = engine(&store)
            .evaluate_metric(&metric_id, ts(2026, 6, 1))
            .unwrap();
        assert_eq!(verdict.status, RagStatus::Unknown);
        assert_eq!(verdict.explanation, "no observations recorded");
    }

    #[test]
    fn record_observation_feeds_the_ledger() {
        let store = Arc::new(MemoryStore::new());
        let org = OrgId::new();
        let (_, metric_id, _) = seed_maximum_metric(&store, org);

        let outcome = engine(&store)
            .record_observation(&metric_id, 110.0, ts(2026, 6, 1))
            .unwrap();
        let breach = outcome.open_breach().unwrap();
        assert_eq!(breach.severity, BreachSeverity::Red);
        assert_eq!(store.breach_row_count(), 1);
    }

    #[test]
    fn facade_rollups_share_the_worst_case_reducer() {
        let store = Arc::new(MemoryStore::new());
        let org = OrgId::new();
        let (category_id, _, indicator) = seed_maximum_metric(&store, org);
        store.push_observation(IndicatorObservation {
            indicator_id: indicator,
            value: 85.0,
            observed_at: ts(2026, 5, 30),
        });

        let e = engine(&store);
        let now = ts(2026, 6, 1);
        assert_eq!(e.category_status(&category_id, now).unwrap().status, RagStatus::Amber);
        assert_eq!(e.enterprise_status(&org, now).unwrap().status, RagStatus::Amber);
    }

    #[test]
    fn unknown_metric_id_is_a_store_error() {
        let store = Arc::new(MemoryStore::new());
        let result = engine(&store).evaluate_metric(&MetricId::new(), ts(2026, 6, 1));
        assert!(matches!(
            result,
            Err(EngineError::Store(StoreError::NotFound { .. }))
        ));
    }
}
