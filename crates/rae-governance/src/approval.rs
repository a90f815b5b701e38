//! # Approval Gate
//!
//! The two blocking governance transitions: statement approval
//! (DRAFT → APPROVED, gated by full chain validation) and metric
//! activation (gated by indicator link plus the shared freshness rule).
//!
//! Both follow one shape: load the target, collect every violated
//! precondition, refuse with the complete list and zero writes if any
//! CRITICAL gap exists, otherwise perform the single status write.
//! A refusal is a typed result, not an exception for control flow.

use thiserror::Error;

use rae_core::{
    ActorId, AppetiteStatement, FreshnessWindow, MetricId, StatementId, StatementStatus,
    StoreError, Timestamp, ToleranceMetric, TransitionError,
};
use rae_store::{ConfigStore, IndicatorStore};

use crate::validator::{ChainValidator, Gap, GapKind, GapSeverity};

/// Governance operation failure.
///
/// `Refused` is a business refusal ("fix your configuration");
/// `Store` is a persistence failure ("please retry"). Callers must be
/// able to tell them apart without string matching.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// One or more preconditions are violated. Carries every gap found,
    /// not just the first.
    #[error("refused: {}", render_gaps(gaps))]
    Refused {
        /// Every violated precondition.
        gaps: Vec<Gap>,
    },

    /// The target entity is not in a state the transition applies to.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Persistence layer failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn render_gaps(gaps: &[Gap]) -> String {
    gaps.iter()
        .map(Gap::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Executes the blocking governance transitions.
pub struct ApprovalGate<'a> {
    config: &'a dyn ConfigStore,
    indicators: &'a dyn IndicatorStore,
    freshness: FreshnessWindow,
}

impl<'a> ApprovalGate<'a> {
    /// Create a gate with the default 90-day freshness window.
    pub fn new(config: &'a dyn ConfigStore, indicators: &'a dyn IndicatorStore) -> Self {
        Self::with_freshness(config, indicators, FreshnessWindow::DEFAULT)
    }

    /// Create a gate with a custom freshness window. The chain
    /// validator it runs inherits the same window, keeping the two
    /// freshness paths in sync.
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

    /// Approve a draft statement, blocked by any CRITICAL chain gap for
    /// the owning organization. No write happens on refusal.
    pub fn approve_statement(
        &self,
        statement_id: &StatementId,
        approver: ActorId,
        now: Timestamp,
    ) -> Result<AppetiteStatement, GovernanceError> {
        let mut statement = self.config.statement(statement_id)?;
        if statement.status != StatementStatus::Draft {
            return Err(TransitionError::InvalidTransition {
                from: statement.status.to_string(),
                to: StatementStatus::Approved.to_string(),
                reason: "only draft statements can be approved".to_string(),
            }
            .into());
        }

        let validation = ChainValidator::with_freshness(self.config, self.indicators, self.freshness)
            .validate_chain(&statement.org_id, now)?;
        if !validation.is_valid {
            tracing::info!(
                statement_id = %statement_id,
                gap_count = validation.gaps.len(),
                "statement approval refused"
            );
            return Err(GovernanceError::Refused {
                gaps: validation.gaps,
            });
        }

        self.config
            .set_statement_approved(statement_id, approver, now)?;
        statement.status = StatementStatus::Approved;
        statement.approved_by = Some(approver);
        statement.approved_at = Some(now);
        tracing::info!(
            statement_id = %statement_id,
            approved_by = %approver,
            "statement approved"
        );
        Ok(statement)
    }

    /// Activate a metric, blocked if it has no indicator link or its
    /// indicator has no fresh observation. Both violations are
    /// collected before refusing. No write happens on refusal.
    pub fn activate_metric(
        &self,
        metric_id: &MetricId,
        activator: ActorId,
        now: Timestamp,
    ) -> Result<ToleranceMetric, GovernanceError> {
        let mut metric = self.config.metric(metric_id)?;
        if metric.is_active {
            tracing::debug!(metric_id = %metric_id, "metric already active");
            return Ok(metric);
        }

        let mut gaps = Vec::new();
        match metric.indicator_id {
            None => gaps.push(Gap {
                kind: GapKind::UnlinkedMetric,
                severity: GapSeverity::Critical,
                issue: format!("metric '{}' has no linked indicator", metric.name),
                detail: None,
            }),
            Some(indicator_id) => match self.indicators.latest_value(&indicator_id)? {
                Some(obs) if self.freshness.is_fresh(obs.observed_at, now) => {}
                Some(obs) => gaps.push(Gap {
                    kind: GapKind::StaleIndicator,
                    severity: GapSeverity::Critical,
                    issue: format!(
                        "metric '{}' has no observation in the last {} days",
                        metric.name, self.freshness.max_age_days
                    ),
                    detail: Some(format!("last observed {}", obs.observed_at)),
                }),
                None => gaps.push(Gap {
                    kind: GapKind::StaleIndicator,
                    severity: GapSeverity::Critical,
                    issue: format!(
                        "metric '{}' has a linked indicator with no observations",
                        metric.name
                    ),
                    detail: None,
                }),
            },
        }

        if !gaps.is_empty() {
            tracing::info!(
                metric_id = %metric_id,
                gap_count = gaps.len(),
                "metric activation refused"
            );
            return Err(GovernanceError::Refused { gaps });
        }

        self.config.set_metric_active(metric_id, activator, now)?;
        metric.is_active = true;
        tracing::info!(
            metric_id = %metric_id,
            activated_by = %activator,
            "metric activated"
        );
        Ok(metric)
    }
}
