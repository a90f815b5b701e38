//! # Breach Transition Planner
//!
//! The breach state machine as a total function: every combination of
//! (severity of the open-like breach, incoming evaluation status) maps to
//! exactly one [`LedgerAction`]. Incoming statuses are classified through
//! [`RagStatus::breach_severity`] and the severity match is exhaustive,
//! so adding a severity or status forces every transition to be
//! reconsidered at compile time.
//!
//! The planner is pure; the tracker in [`crate::tracker`] executes the
//! planned action under the per-metric lock.

use serde::{Deserialize, Serialize};

use rae_core::{BreachSeverity, RagStatus};

/// What the tracker should do to the ledger for one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerAction {
    /// Leave the ledger untouched.
    NoOp,
    /// Transition the open-like breach to RESOLVED.
    Resolve,
    /// Insert a new OPEN breach at the given severity and notify.
    OpenNew(BreachSeverity),
    /// Update observed value and timestamp on the existing row. No new
    /// row, no re-notification.
    Refresh,
    /// Close the AMBER row, insert a linked RED row, and notify.
    Escalate,
    /// Mutate the RED row down to AMBER in place. One ledger entry
    /// survives flapping; deliberately asymmetric with [`Self::Escalate`].
    DeEscalateInPlace,
}

/// Plan the ledger action for one (open-like severity, incoming status)
/// pair.
///
/// Breach-grade statuses are classified by
/// [`RagStatus::breach_severity`]; GREEN resolves an open-like breach and
/// UNKNOWN never touches the ledger, since absence of data is surfaced by
/// the chain validator's freshness check rather than recorded as a
/// breach.
pub fn plan(existing: Option<BreachSeverity>, incoming: RagStatus) -> LedgerAction {
    let Some(incoming_severity) = incoming.breach_severity() else {
        return match (existing, incoming) {
            (Some(_), RagStatus::Green) => LedgerAction::Resolve,
            _ => LedgerAction::NoOp,
        };
    };
    match (existing, incoming_severity) {
        (None, severity) => LedgerAction::OpenNew(severity),
        (Some(BreachSeverity::Amber), BreachSeverity::Amber)
        | (Some(BreachSeverity::Red), BreachSeverity::Red) => LedgerAction::Refresh,
        (Some(BreachSeverity::Amber), BreachSeverity::Red) => LedgerAction::Escalate,
        (Some(BreachSeverity::Red), BreachSeverity::Amber) => LedgerAction::DeEscalateInPlace,
    }
}
