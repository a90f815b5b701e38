#![deny(missing_docs)]

//! # rae-governance — Governance Surface of the Risk Appetite Engine
//!
//! The components that decide what the configuration is allowed to do:
//!
//! - [`validator`] — the chain validator, walking risk category →
//!   appetite category → metric → indicator → fresh data and collecting
//!   every gap.
//! - [`approval`] — the approval gate: statement approval and metric
//!   activation, refused with the full gap list while any CRITICAL gap
//!   stands, with zero writes on refusal.
//! - [`engine`] — the [`AppetiteEngine`] facade assembling evaluator,
//!   aggregator, tracker, validator, and gate over shared stores.
//! - [`sweep`] — the cancellable batch re-evaluation across all active
//!   metrics.

pub mod approval;
pub mod engine;
pub mod sweep;
pub mod validator;

pub use approval::{ApprovalGate, GovernanceError};
pub use engine::{AppetiteEngine, EngineError};
pub use sweep::{CancelFlag, SweepReport};
pub use validator::{ChainValidationResult, ChainValidator, Gap, GapKind, GapSeverity};
