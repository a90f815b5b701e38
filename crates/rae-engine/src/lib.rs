#![deny(missing_docs)]

//! # rae-engine — Threshold Evaluation & Status Aggregation
//!
//! The pure, read-side half of the Risk Appetite Engine:
//!
//! - [`evaluator`]: classify one observed value against a metric's
//!   configured limits, per metric kind. Side-effect free; consults the
//!   indicator store only for DIRECTIONAL lookback.
//! - [`aggregator`]: roll metric-level statuses up to category level and
//!   category level up to the enterprise verdict, using the single
//!   [`RagStatus::worst_of`](rae_core::RagStatus::worst_of) reducer at
//!   both levels. Always recomputed, never cached — a cache here could
//!   drift from the ledger and the latest indicator values.
//!
//! Both halves are stateless and safe for unlimited parallel invocation.

pub mod aggregator;
pub mod evaluator;

pub use aggregator::{
    CategoryAppetiteStatus, EnterpriseAppetiteStatus, MetricStatusDetail, StatusAggregator,
    StatusCounts,
};
pub use evaluator::{evaluate, EvaluationError, ThresholdEvaluationResult};
