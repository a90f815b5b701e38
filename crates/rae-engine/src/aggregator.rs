//! # Status Aggregator
//!
//! Pure read-side roll-ups: for each active metric under a category,
//! fetch its most recent observed value, run the threshold evaluator,
//! and reduce the verdicts with the single worst-case-wins lattice.
//! The same reducer is applied again from category to enterprise.
//!
//! Nothing here is cached. Every call recomputes from the current
//! configuration and the latest indicator values, so the roll-up can
//! never drift from the ledger.
//!
//! A category with zero active metrics reports UNKNOWN, never GREEN —
//! absence of monitoring is not evidence of safety.

use serde::{Deserialize, Serialize};

use rae_core::{CategoryId, MetricId, OrgId, RagStatus, Timestamp, ToleranceMetric};
use rae_store::{ConfigStore, IndicatorStore};

use crate::evaluator::{evaluate, EvaluationError, ThresholdEvaluationResult};

/// Per-metric line in a category breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricStatusDetail {
    /// The metric.
    pub metric_id: MetricId,
    /// The metric's display name.
    pub name: String,
    /// The evaluated status.
    pub status: RagStatus,
    /// The latest observed value, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<f64>,
    /// The threshold band description from the evaluator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    /// Why the status was assigned.
    pub explanation: String,
}

/// Status tally across one breakdown level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    /// Number of GREEN entries.
    pub green: usize,
    /// Number of AMBER entries.
    pub amber: usize,
    /// Number of RED entries.
    pub red: usize,
    /// Number of UNKNOWN entries.
    pub unknown: usize,
}

impl StatusCounts {
    /// Tally an iterator of statuses.
    pub fn tally(statuses: impl IntoIterator<Item = RagStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            match status {
                RagStatus::Green => counts.green += 1,
                RagStatus::Amber => counts.amber += 1,
                RagStatus::Red => counts.red += 1,
                RagStatus::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    /// Total entries tallied.
    pub fn total(&self) -> usize {
        self.green + self.amber + self.red + self.unknown
    }
}

/// Ephemeral category roll-up, recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAppetiteStatus {
    /// The category.
    pub category_id: CategoryId,
    /// The category's display name.
    pub name: String,
    /// Worst-case roll-up of the member metrics.
    pub status: RagStatus,
    /// Per-metric breakdown (active metrics only).
    pub metrics: Vec<MetricStatusDetail>,
    /// Status tally over the member metrics.
    pub counts: StatusCounts,
}

/// Ephemeral enterprise roll-up, recomputed on demand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnterpriseAppetiteStatus {
    /// The organization.
    pub org_id: OrgId,
    /// Worst-case roll-up of the category statuses.
    pub status: RagStatus,
    /// Per-category breakdown.
    pub categories: Vec<CategoryAppetiteStatus>,
    /// Status tally over the categories.
    pub counts: StatusCounts,
}

/// Computes category and enterprise roll-ups from the configuration and
/// indicator stores. Stateless; safe for unlimited parallel invocation.
pub struct StatusAggregator<'a> {
    config: &'a dyn ConfigStore,
    indicators: &'a dyn IndicatorStore,
}

impl<'a> StatusAggregator<'a> {
    /// Create an aggregator over the given stores.
    pub fn new(config: &'a dyn ConfigStore, indicators: &'a dyn IndicatorStore) -> Self {
        Self { config, indicators }
    }

    /// Evaluate one active metric against its latest observation.
    fn metric_detail(
        &self,
        metric: &ToleranceMetric,
        now: Timestamp,
    ) -> Result<MetricStatusDetail, EvaluationError> {
        let Some(indicator_id) = metric.indicator_id else {
            return Ok(MetricStatusDetail {
                metric_id: metric.id,
                name: metric.name.clone(),
                status: RagStatus::Unknown,
                observed_value: None,
                threshold: None,
                explanation: "no indicator linked".to_string(),
            });
        };
        let Some(latest) = self.indicators.latest_value(&indicator_id)? else {
            return Ok(MetricStatusDetail {
                metric_id: metric.id,
                name: metric.name.clone(),
                status: RagStatus::Unknown,
                observed_value: None,
                threshold: None,
                explanation: "no observations recorded".to_string(),
            });
        };

        let ThresholdEvaluationResult {
            status,
            threshold,
            explanation,
            observed_value,
            ..
        } = evaluate(metric, latest.value, self.indicators, now)?;
        Ok(MetricStatusDetail {
            metric_id: metric.id,
            name: metric.name.clone(),
            status,
            observed_value: Some(observed_value),
            threshold: Some(threshold),
            explanation,
        })
    }

    /// Roll up one category from its active metrics, as of `now`.
    pub fn category_status(
        &self,
        category_id: &CategoryId,
        now: Timestamp,
    ) -> Result<CategoryAppetiteStatus, EvaluationError> {
        let category = self.config.category(category_id)?;
        let metrics = self.config.metrics_for_category(category_id)?;

        let mut details = Vec::new();
        for metric in metrics.iter().filter(|m| m.is_active) {
            details.push(self.metric_detail(metric, now)?);
        }

        let status = RagStatus::worst_of(details.iter().map(|d| d.status));
        let counts = StatusCounts::tally(details.iter().map(|d| d.status));
        tracing::debug!(
            category_id = %category_id,
            status = %status,
            metric_count = details.len(),
            "category appetite status computed"
        );
        Ok(CategoryAppetiteStatus {
            category_id: *category_id,
            name: category.name,
            status,
            metrics: details,
            counts,
        })
    }

    /// Roll up the enterprise verdict from every category, as of `now`.
    pub fn enterprise_status(
        &self,
        org_id: &OrgId,
        now: Timestamp,
    ) -> Result<EnterpriseAppetiteStatus, EvaluationError> {
        let categories = self.config.categories(org_id)?;

        let mut breakdowns = Vec::new();
        for category in &categories {
            breakdowns.push(self.category_status(&category.id, now)?);
        }

        let status = RagStatus::worst_of(breakdowns.iter().map(|c| c.status));
        let counts = StatusCounts::tally(breakdowns.iter().map(|c| c.status));
        tracing::debug!(
            org_id = %org_id,
            status = %status,
            category_count = breakdowns.len(),
            "enterprise appetite status computed"
        );
        Ok(EnterpriseAppetiteStatus {
            org_id: *org_id,
            status,
            categories: breakdowns,
            counts,
        })
    }
}
