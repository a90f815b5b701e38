//! # Store & Dispatcher Traits
//!
//! The four collaborator seams. All methods are synchronous and return
//! [`StoreError`] on persistence failure; an absent row is `Ok(None)` or
//! `StoreError::NotFound` depending on whether absence is routine
//! (indicator data) or a broken reference (configuration rows).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rae_core::{
    ActorId, AppetiteBreach, AppetiteCategory, AppetiteStatement, BreachId, BreachSeverity,
    CategoryId, IndicatorId, IndicatorObservation, MetricId, OrgId, RiskCategoryRef, StatementId,
    StoreError, Timestamp, ToleranceMetric,
};

/// Read access to tolerance metric, appetite category, and statement
/// configuration, plus the two status writes owned by the approval gate.
pub trait ConfigStore: Send + Sync {
    /// Load one metric by id.
    fn metric(&self, id: &MetricId) -> Result<ToleranceMetric, StoreError>;

    /// All active metrics for an organization.
    fn active_metrics(&self, org_id: &OrgId) -> Result<Vec<ToleranceMetric>, StoreError>;

    /// All metrics (active or not) owned by one appetite category.
    fn metrics_for_category(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<ToleranceMetric>, StoreError>;

    /// Load one appetite category by id.
    fn category(&self, id: &CategoryId) -> Result<AppetiteCategory, StoreError>;

    /// All appetite categories for an organization.
    fn categories(&self, org_id: &OrgId) -> Result<Vec<AppetiteCategory>, StoreError>;

    /// Risk categories currently in use by active risk records, as
    /// reported by the risk register.
    fn risk_categories_in_use(&self, org_id: &OrgId) -> Result<Vec<RiskCategoryRef>, StoreError>;

    /// Load one appetite statement by id.
    fn statement(&self, id: &StatementId) -> Result<AppetiteStatement, StoreError>;

    /// Record statement approval: status, approver, timestamp.
    ///
    /// Called only by the approval gate after chain validation passes.
    fn set_statement_approved(
        &self,
        id: &StatementId,
        approved_by: ActorId,
        approved_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Record metric activation: flag, activator, timestamp.
    ///
    /// Called only by the approval gate after link/freshness checks pass.
    fn set_metric_active(
        &self,
        id: &MetricId,
        activated_by: ActorId,
        activated_at: Timestamp,
    ) -> Result<(), StoreError>;
}

/// Read access to Key Risk Indicator time series.
pub trait IndicatorStore: Send + Sync {
    /// The most recent observation for an indicator, if any exists.
    fn latest_value(
        &self,
        indicator_id: &IndicatorId,
    ) -> Result<Option<IndicatorObservation>, StoreError>;

    /// The most recent observation at-or-before `as_of`, if any.
    ///
    /// Used by the directional evaluator's lookback.
    fn value_as_of(
        &self,
        indicator_id: &IndicatorId,
        as_of: Timestamp,
    ) -> Result<Option<IndicatorObservation>, StoreError>;
}

/// The breach ledger. Written exclusively by the breach tracker; the
/// implementation must serialize writes per metric (row-level lock) so
/// the tracker's in-process lock holds across service instances.
pub trait BreachStore: Send + Sync {
    /// The single open-like (OPEN or IN_PROGRESS) breach for a metric,
    /// if one exists.
    fn latest_open_breach(
        &self,
        metric_id: &MetricId,
    ) -> Result<Option<AppetiteBreach>, StoreError>;

    /// Load one breach by id.
    fn breach(&self, id: &BreachId) -> Result<AppetiteBreach, StoreError>;

    /// All ledger entries for a metric, newest first.
    fn breaches_for_metric(&self, metric_id: &MetricId)
        -> Result<Vec<AppetiteBreach>, StoreError>;

    /// Insert a new ledger row.
    ///
    /// Must refuse (with `StoreError::Conflict`) an insert that would
    /// create a second open-like row for the same metric — the
    /// last-resort backstop under concurrent writers.
    fn insert_breach(&self, breach: &AppetiteBreach) -> Result<(), StoreError>;

    /// Update an existing ledger row in place.
    ///
    /// Must refuse writes to BOARD_ACCEPTED rows (the access policy
    /// makes them immutable to ordinary writers).
    fn update_breach(&self, breach: &AppetiteBreach) -> Result<(), StoreError>;
}

/// An escalation notice handed to the notification dispatcher when a
/// breach is opened or escalated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationNotice {
    /// The owning organization.
    pub org_id: OrgId,
    /// The breached metric.
    pub metric_id: MetricId,
    /// Severity of the new or escalated breach.
    pub severity: BreachSeverity,
    /// Who should be notified (role keys resolved by the dispatcher).
    pub recipients: Vec<String>,
    /// Response SLA in days.
    pub sla_days: u32,
    /// What the recipients are expected to do.
    pub action_required: String,
}

/// Failure to dispatch a notification. Logged and swallowed by the
/// tracker — never rolls back the ledger mutation that triggered it.
#[derive(Error, Debug)]
#[error("notification dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Fire-and-forget escalation notification transport.
pub trait NotificationDispatcher: Send + Sync {
    /// Dispatch an escalation notice.
    fn notify(&self, notice: &EscalationNotice) -> Result<(), DispatchError>;
}
