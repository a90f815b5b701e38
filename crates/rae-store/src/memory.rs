//! # In-Memory Store
//!
//! A `parking_lot`-backed implementation of the three store traits plus
//! two notification doubles. This is the test double used across the
//! workspace; it also enforces the same backstop invariants a production
//! store enforces (one open-like breach per metric, BOARD_ACCEPTED rows
//! immutable), so tests exercise the real contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use rae_core::{
    ActorId, AppetiteBreach, AppetiteCategory, AppetiteStatement, BreachId, BreachStatus,
    CategoryId, IndicatorId, IndicatorObservation, MetricId, OrgId, RiskCategoryRef, StatementId,
    StatementStatus, StoreError, Timestamp, ToleranceMetric,
};

use crate::traits::{
    BreachStore, ConfigStore, DispatchError, EscalationNotice, IndicatorStore,
    NotificationDispatcher,
};

#[derive(Default)]
struct Tables {
    metrics: HashMap<MetricId, ToleranceMetric>,
    categories: HashMap<CategoryId, AppetiteCategory>,
    statements: HashMap<StatementId, AppetiteStatement>,
    risk_in_use: HashMap<OrgId, Vec<RiskCategoryRef>>,
    // Observations are kept sorted ascending by observed_at.
    observations: HashMap<IndicatorId, Vec<IndicatorObservation>>,
    breaches: HashMap<BreachId, AppetiteBreach>,
}

/// In-memory store implementing [`ConfigStore`], [`IndicatorStore`],
/// and [`BreachStore`].
///
/// Counts configuration writes so tests can assert the approval gate's
/// zero-writes-on-refusal property.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    config_writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tolerance metric.
    pub fn insert_metric(&self, metric: ToleranceMetric) {
        self.tables.write().metrics.insert(metric.id, metric);
    }

    /// Seed an appetite category.
    pub fn insert_category(&self, category: AppetiteCategory) {
        self.tables.write().categories.insert(category.id, category);
    }

    /// Seed an appetite statement.
    pub fn insert_statement(&self, statement: AppetiteStatement) {
        self.tables
            .write()
            .statements
            .insert(statement.id, statement);
    }

    /// Declare which risk categories the risk register reports as in use.
    pub fn set_risk_categories_in_use(&self, org_id: OrgId, categories: Vec<RiskCategoryRef>) {
        self.tables.write().risk_in_use.insert(org_id, categories);
    }

    /// Append an indicator observation, keeping the series sorted.
    pub fn push_observation(&self, observation: IndicatorObservation) {
        let mut tables = self.tables.write();
        let series = tables
            .observations
            .entry(observation.indicator_id)
            .or_default();
        series.push(observation);
        series.sort_by_key(|o| o.observed_at);
    }

    /// Total number of breach ledger rows, across all metrics.
    pub fn breach_row_count(&self) -> usize {
        self.tables.read().breaches.len()
    }

    /// How many configuration writes (statement approval, metric
    /// activation) have been performed.
    pub fn config_write_count(&self) -> usize {
        self.config_writes.load(Ordering::SeqCst)
    }
}

impl ConfigStore for MemoryStore {
    fn metric(&self, id: &MetricId) -> Result<ToleranceMetric, StoreError> {
        self.tables
            .read()
            .metrics
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "metric",
                id: id.to_string(),
            })
    }

    fn active_metrics(&self, org_id: &OrgId) -> Result<Vec<ToleranceMetric>, StoreError> {
        Ok(self
            .tables
            .read()
            .metrics
            .values()
            .filter(|m| m.org_id == *org_id && m.is_active)
            .cloned()
            .collect())
    }

    fn metrics_for_category(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<ToleranceMetric>, StoreError> {
        Ok(self
            .tables
            .read()
            .metrics
            .values()
            .filter(|m| m.category_id == *category_id)
            .cloned()
            .collect())
    }

    fn category(&self, id: &CategoryId) -> Result<AppetiteCategory, StoreError> {
        self.tables
            .read()
            .categories
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "category",
                id: id.to_string(),
            })
    }

    fn categories(&self, org_id: &OrgId) -> Result<Vec<AppetiteCategory>, StoreError> {
        Ok(self
            .tables
            .read()
            .categories
            .values()
            .filter(|c| c.org_id == *org_id)
            .cloned()
            .collect())
    }

    fn risk_categories_in_use(&self, org_id: &OrgId) -> Result<Vec<RiskCategoryRef>, StoreError> {
        Ok(self
            .tables
            .read()
            .risk_in_use
            .get(org_id)
            .cloned()
            .unwrap_or_default())
    }

    fn statement(&self, id: &StatementId) -> Result<AppetiteStatement, StoreError> {
        self.tables
            .read()
            .statements
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "statement",
                id: id.to_string(),
            })
    }

    fn set_statement_approved(
        &self,
        id: &StatementId,
        approved_by: ActorId,
        approved_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let statement = tables
            .statements
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "statement",
                id: id.to_string(),
            })?;
        statement.status = StatementStatus::Approved;
        statement.approved_by = Some(approved_by);
        statement.approved_at = Some(approved_at);
        self.config_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_metric_active(
        &self,
        id: &MetricId,
        _activated_by: ActorId,
        _activated_at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let metric = tables
            .metrics
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "metric",
                id: id.to_string(),
            })?;
        metric.is_active = true;
        self.config_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl IndicatorStore for MemoryStore {
    fn latest_value(
        &self,
        indicator_id: &IndicatorId,
    ) -> Result<Option<IndicatorObservation>, StoreError> {
        Ok(self
            .tables
            .read()
            .observations
            .get(indicator_id)
            .and_then(|series| series.last().copied()))
    }

    fn value_as_of(
        &self,
        indicator_id: &IndicatorId,
        as_of: Timestamp,
    ) -> Result<Option<IndicatorObservation>, StoreError> {
        Ok(self
            .tables
            .read()
            .observations
            .get(indicator_id)
            .and_then(|series| {
                series
                    .iter()
                    .rev()
                    .find(|o| o.observed_at <= as_of)
                    .copied()
            }))
    }
}

impl BreachStore for MemoryStore {
    fn latest_open_breach(
        &self,
        metric_id: &MetricId,
    ) -> Result<Option<AppetiteBreach>, StoreError> {
        let tables = self.tables.read();
        let mut open: Vec<&AppetiteBreach> = tables
            .breaches
            .values()
            .filter(|b| b.metric_id == *metric_id && b.status.is_open_like())
            .collect();
        open.sort_by_key(|b| b.detected_at);
        Ok(open.last().map(|b| (*b).clone()))
    }

    fn breach(&self, id: &BreachId) -> Result<AppetiteBreach, StoreError> {
        self.tables
            .read()
            .breaches
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "breach",
                id: id.to_string(),
            })
    }

    fn breaches_for_metric(
        &self,
        metric_id: &MetricId,
    ) -> Result<Vec<AppetiteBreach>, StoreError> {
        let tables = self.tables.read();
        let mut rows: Vec<AppetiteBreach> = tables
            .breaches
            .values()
            .filter(|b| b.metric_id == *metric_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.detected_at.cmp(&a.detected_at));
        Ok(rows)
    }

    fn insert_breach(&self, breach: &AppetiteBreach) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        if breach.status.is_open_like() {
            let duplicate = tables
                .breaches
                .values()
                .any(|b| b.metric_id == breach.metric_id && b.status.is_open_like());
            if duplicate {
                return Err(StoreError::Conflict(format!(
                    "metric {} already has an open-like breach",
                    breach.metric_id
                )));
            }
        }
        tables.breaches.insert(breach.id, breach.clone());
        Ok(())
    }

    fn update_breach(&self, breach: &AppetiteBreach) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let existing = tables
            .breaches
            .get_mut(&breach.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "breach",
                id: breach.id.to_string(),
            })?;
        if existing.status == BreachStatus::BoardAccepted {
            return Err(StoreError::Conflict(format!(
                "breach {} is BOARD_ACCEPTED and immutable",
                breach.id
            )));
        }
        *existing = breach.clone();
        Ok(())
    }
}

/// Notification double that records every notice for later assertion.
#[derive(Default)]
pub struct RecordingDispatcher {
    notices: Mutex<Vec<EscalationNotice>>,
}

impl RecordingDispatcher {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices dispatched so far, in order.
    pub fn notices(&self) -> Vec<EscalationNotice> {
        self.notices.lock().clone()
    }

    /// Convenience count.
    pub fn notice_count(&self) -> usize {
        self.notices.lock().len()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn notify(&self, notice: &EscalationNotice) -> Result<(), DispatchError> {
        self.notices.lock().push(notice.clone());
        Ok(())
    }
}

/// Notification double whose every dispatch fails. Used to verify that
/// dispatch failure never rolls back a ledger mutation.
#[derive(Debug, Default)]
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn notify(&self, _notice: &EscalationNotice) -> Result<(), DispatchError> {
        Err(DispatchError("transport unavailable".to_string()))
    }
}
