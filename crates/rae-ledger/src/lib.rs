#![deny(missing_docs)]

//! # rae-ledger — Breach Ledger Writer
//!
//! Turns evaluated observations into breach ledger mutations. Split in
//! two layers:
//!
//! - [`planner`] — the breach state machine as a pure, total function
//!   from (open-like severity, incoming status) to one [`LedgerAction`].
//! - [`tracker`] — the [`BreachTracker`], which serializes observations
//!   per metric, applies the planned action to a `BreachStore`, and
//!   fires escalation notices on open and escalate only.
//!
//! The contract upheld here: at most one OPEN/IN_PROGRESS breach per
//! metric, escalations linked through `prior_breach_id`, de-escalations
//! mutated in place, and repeated identical observations absorbed as
//! refreshes.

pub mod planner;
pub mod tracker;

pub use planner::{plan, LedgerAction};
pub use tracker::{BreachTracker, LedgerOutcome, TrackerError};
