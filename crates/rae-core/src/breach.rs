//! # Breach Ledger Records
//!
//! The persisted record of excursions outside tolerance: severity,
//! lifecycle status, escalation provenance, remediation and board
//! acceptance.
//!
//! The ledger's idempotence contract: at most one breach per metric in an
//! open-like status ({OPEN, IN_PROGRESS}) at any time. The tracker in
//! `rae-ledger` is the only writer that upholds it.

use serde::{Deserialize, Serialize};

use crate::identity::{ActorId, BreachId, IndicatorId, MetricId, OrgId};
use crate::temporal::Timestamp;

/// How badly the observed value exceeded tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachSeverity {
    /// Outside the amber band.
    Amber,
    /// Outside the red band.
    Red,
}

impl std::fmt::Display for BreachSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Amber => f.write_str("AMBER"),
            Self::Red => f.write_str("RED"),
        }
    }
}

/// Lifecycle status of a breach ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachStatus {
    /// Newly detected, no remediation underway.
    Open,
    /// Remediation in progress.
    InProgress,
    /// The metric returned inside tolerance.
    Resolved,
    /// Administratively closed (e.g., superseded by an escalation).
    Closed,
    /// The board formally accepted the excursion. Terminal override;
    /// immutable to ordinary writers (enforced by the persistence
    /// layer's access policy).
    BoardAccepted,
}

impl BreachStatus {
    /// Whether this status counts against the one-open-breach-per-metric
    /// invariant.
    pub fn is_open_like(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

}

impl std::fmt::Display for BreachStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::InProgress => f.write_str("IN_PROGRESS"),
            Self::Resolved => f.write_str("RESOLVED"),
            Self::Closed => f.write_str("CLOSED"),
            Self::BoardAccepted => f.write_str("BOARD_ACCEPTED"),
        }
    }
}

/// One ledger entry recording an open-or-historical excursion outside
/// tolerance for one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppetiteBreach {
    /// Unique breach identifier.
    pub id: BreachId,
    /// The owning organization.
    pub org_id: OrgId,
    /// The breached metric.
    pub metric_id: MetricId,
    /// The indicator whose value triggered detection, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator_id: Option<IndicatorId>,
    /// Severity at detection (may later be de-escalated in place).
    pub severity: BreachSeverity,
    /// Lifecycle status.
    pub status: BreachStatus,
    /// The observed value that breached.
    pub observed_value: f64,
    /// The threshold value in force at detection time.
    pub threshold_value: f64,
    /// When the breach was detected.
    pub detected_at: Timestamp,
    /// When the ledger row was last refreshed by an observation.
    pub last_observed_at: Timestamp,
    /// The closed breach this one escalated from, forming a singly
    /// linked provenance chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior_breach_id: Option<BreachId>,
    /// Free-text resolution or closure note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_note: Option<String>,
    /// Who resolved the breach.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<ActorId>,
    /// When the breach left its open-like status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<Timestamp>,
    /// Remediation plan text, once remediation is underway.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation_plan: Option<String>,
    /// Who accepted the breach on behalf of the board.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_accepted_by: Option<ActorId>,
    /// Board acceptance rationale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_acceptance_rationale: Option<String>,
}

impl AppetiteBreach {
    /// Open a new breach at the given severity, detected now.
    pub fn open(
        org_id: OrgId,
        metric_id: MetricId,
        indicator_id: Option<IndicatorId>,
        severity: BreachSeverity,
        observed_value: f64,
        threshold_value: f64,
        detected_at: Timestamp,
    ) -> Self {
        Self {
            id: BreachId::new(),
            org_id,
            metric_id,
            indicator_id,
            severity,
            status: BreachStatus::Open,
            observed_value,
            threshold_value,
            detected_at,
            last_observed_at: detected_at,
            prior_breach_id: None,
            resolution_note: None,
            resolved_by: None,
            resolved_at: None,
            remediation_plan: None,
            board_accepted_by: None,
            board_acceptance_rationale: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_like_covers_open_and_in_progress() {
        assert!(BreachStatus::Open.is_open_like());
        assert!(BreachStatus::InProgress.is_open_like());
        assert!(!BreachStatus::Resolved.is_open_like());
        assert!(!BreachStatus::Closed.is_open_like());
        assert!(!BreachStatus::BoardAccepted.is_open_like());
    }

    #[test]
    fn newly_opened_breach_shape() {
        let now = Timestamp::now();
        let breach = AppetiteBreach::open(
            OrgId::new(),
            MetricId::new(),
            None,
            BreachSeverity::Amber,
            85.0,
            80.0,
            now,
        );
        assert_eq!(breach.status, BreachStatus::Open);
        assert_eq!(breach.severity, BreachSeverity::Amber);
        assert!(breach.prior_breach_id.is_none());
        assert_eq!(breach.last_observed_at, now);
    }

    #[test]
    fn status_display_is_upper_snake() {
        assert_eq!(BreachStatus::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(BreachStatus::BoardAccepted.to_string(), "BOARD_ACCEPTED");
    }
}
