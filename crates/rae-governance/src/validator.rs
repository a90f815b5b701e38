//! # Chain Validator
//!
//! Walks the configuration dependency chain — risk category → appetite
//! category → tolerance metric → indicator → fresh data — and reports
//! every gap it finds. All four checks run even when an earlier one
//! fails; the result enumerates every problem at once rather than
//! stopping at the first.
//!
//! CRITICAL gaps invalidate the chain and block approvals. Staleness is
//! a WARNING: data going quiet should be visible but must not retroactively
//! block an approval that was sound when granted.
//!
//! This is the single precondition check behind the approval gate. The
//! gate consumes this validator rather than re-implementing any check.

use serde::{Deserialize, Serialize};

use rae_core::{FreshnessWindow, OrgId, StoreError, Timestamp};
use rae_store::{ConfigStore, IndicatorStore};

/// How badly a gap compromises the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapSeverity {
    /// Invalidates the chain and blocks approvals.
    Critical,
    /// Visible but never blocking.
    Warning,
}

impl std::fmt::Display for GapSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Critical => f.write_str("CRITICAL"),
            Self::Warning => f.write_str("WARNING"),
        }
    }
}

/// Which link of the chain a gap sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    /// A risk category in use has no appetite category.
    MissingAppetiteCategory,
    /// An appetite category owns no tolerance metrics.
    CategoryWithoutMetrics,
    /// An active metric has no indicator link.
    UnlinkedMetric,
    /// An active, linked metric's indicator has no fresh observation.
    StaleIndicator,
}

/// One gap in the configuration chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gap {
    /// Which link is broken.
    pub kind: GapKind,
    /// Whether this gap blocks approvals.
    pub severity: GapSeverity,
    /// Human-readable description of the problem.
    pub issue: String,
    /// Optional extra context (e.g., last observation date).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.issue)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// The full result of one chain validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainValidationResult {
    /// True iff there are zero CRITICAL gaps. WARNINGs never invalidate.
    pub is_valid: bool,
    /// Every gap found, in check order.
    pub gaps: Vec<Gap>,
}

impl ChainValidationResult {
    fn from_gaps(gaps: Vec<Gap>) -> Self {
        let is_valid = !gaps.iter().any(|g| g.severity == GapSeverity::Critical);
        Self { is_valid, gaps }
    }

    /// The blocking subset of the gaps.
    pub fn critical_gaps(&self) -> impl Iterator<Item = &Gap> {
        self.gaps
            .iter()
            .filter(|g| g.severity == GapSeverity::Critical)
    }
}

/// Validates an organization's configuration chain end to end.
pub struct ChainValidator<'a> {
    config: &'a dyn ConfigStore,
    indicators: &'a dyn IndicatorStore,
    freshness: FreshnessWindow,
}

impl<'a> ChainValidator<'a> {
    /// Create a validator with the default 90-day freshness window.
    pub fn new(config: &'a dyn ConfigStore, indicators: &'a dyn IndicatorStore) -> Self {
        Self::with_freshness(config, indicators, FreshnessWindow::DEFAULT)
    }

    /// Create a validator with a custom freshness window.
    pub fn with_freshness(
        config: &'a dyn ConfigStore,
        indicators: &'a dyn IndicatorStore,
        freshness: FreshnessWindow,
    ) -> Self {
        Self {
            config,
            indicators,
            freshness,
        }
    }

    /// Run all four checks and collect every gap, as of `now`.
    pub fn validate_chain(
        &self,
        org_id: &OrgId,
        now: Timestamp,
    ) -> Result<ChainValidationResult, StoreError> {
        let mut gaps = Vec::new();

        let categories = self.config.categories(org_id)?;
        let in_use = self.config.risk_categories_in_use(org_id)?;

        // 1. Every risk category in use has an appetite category.
        for risk_category in &in_use {
            let covered = categories
                .iter()
                .any(|c| c.risk_category_id == risk_category.id);
            if !covered {
                gaps.push(Gap {
                    kind: GapKind::MissingAppetiteCategory,
                    severity: GapSeverity::Critical,
                    issue: format!(
                        "risk category '{}' has active risks but no appetite category",
                        risk_category.name
                    ),
                    detail: Some(format!("risk_category_id={}", risk_category.id)),
                });
            }
        }

        // 2. Every appetite category owns at least one metric.
        for category in &categories {
            let metrics = self.config.metrics_for_category(&category.id)?;
            if metrics.is_empty() {
                gaps.push(Gap {
                    kind: GapKind::CategoryWithoutMetrics,
                    severity: GapSeverity::Critical,
                    issue: format!(
                        "appetite category '{}' has no tolerance metrics",
                        category.name
                    ),
                    detail: None,
                });
            }
        }

        // 3 & 4. Every active metric is linked, and its data is fresh.
        for metric in self.config.active_metrics(org_id)? {
            let Some(indicator_id) = metric.indicator_id else {
                gaps.push(Gap {
                    kind: GapKind::UnlinkedMetric,
                    severity: GapSeverity::Critical,
                    issue: format!("active metric '{}' has no linked indicator", metric.name),
                    detail: None,
                });
                continue;
            };
            match self.indicators.latest_value(&indicator_id)? {
                Some(obs) if self.freshness.is_fresh(obs.observed_at, now) => {}
                Some(obs) => gaps.push(Gap {
                    kind: GapKind::StaleIndicator,
                    severity: GapSeverity::Warning,
                    issue: format!(
                        "metric '{}' has no observation in the last {} days",
                        metric.name, self.freshness.max_age_days
                    ),
                    detail: Some(format!("last observed {}", obs.observed_at)),
                }),
                None => gaps.push(Gap {
                    kind: GapKind::StaleIndicator,
                    severity: GapSeverity::Warning,
                    issue: format!(
                        "metric '{}' has a linked indicator with no observations",
                        metric.name
                    ),
                    detail: None,
                }),
            }
        }

        let result = ChainValidationResult::from_gaps(gaps);
        tracing::debug!(
            org_id = %org_id,
            is_valid = result.is_valid,
            gap_count = result.gaps.len(),
            "chain validated"
        );
        Ok(result)
    }
}
