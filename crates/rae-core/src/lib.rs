#![deny(missing_docs)]

//! # rae-core — Foundational Types for the Risk Appetite Engine
//!
//! This crate defines the types that every other crate in the workspace
//! depends on. It has no internal crate dependencies — only `serde`,
//! `thiserror`, `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a
//!    distinct type. You cannot pass a [`MetricId`] where an [`OrgId`] is
//!    expected.
//!
//! 2. **Single [`RagStatus`] enum with one severity lattice.** The
//!    worst-case-wins roll-up rule is implemented once ([`RagStatus::worst`],
//!    [`RagStatus::worst_of`]) and reused at every aggregation level. No
//!    independent precedence lists that can diverge.
//!
//! 3. **One freshness predicate.** [`FreshnessWindow`] is the single
//!    definition of "recent enough" shared by the chain validator and the
//!    approval gate.
//!
//! 4. **Structured errors.** Per-subsystem `thiserror` enums
//!    ([`ConfigurationError`], [`TransitionError`], [`StoreError`]) that
//!    consuming crates compose with `#[from]` — no `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod breach;
pub mod category;
pub mod error;
pub mod identity;
pub mod metric;
pub mod status;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use breach::{AppetiteBreach, BreachSeverity, BreachStatus};
pub use category::{
    AppetiteCategory, AppetiteLevel, AppetiteStatement, RiskCategoryRef, StatementStatus,
};
pub use error::{ConfigurationError, StoreError, TransitionError};
pub use identity::{
    ActorId, BreachId, CategoryId, IndicatorId, MetricId, OrgId, RiskCategoryId, StatementId,
};
pub use metric::{
    DirectionalConfig, IndicatorObservation, Materiality, MetricKind, ThresholdBands,
    ToleranceMetric, TrendPolarity,
};
pub use status::RagStatus;
pub use temporal::{FreshnessWindow, Timestamp};
