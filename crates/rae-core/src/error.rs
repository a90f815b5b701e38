//! # Error Hierarchy
//!
//! Structured error types for the Risk Appetite Engine, built with
//! `thiserror`. No `Box<dyn Error>`, no `.unwrap()` outside tests.
//!
//! The taxonomy keeps three classes distinct so callers can tell them
//! apart without string matching:
//!
//! - configuration errors (a programmer or configurator mistake, never
//!   coerced to a business status),
//! - state transition violations (a lifecycle move refused from the
//!   current status),
//! - persistence failures (retryable, a different class from business
//!   refusals).
//!
//! Each consuming crate composes these into its own error enum with
//! `#[from]`; the facade's error in `rae-governance` is the outermost
//! surface. Precondition refusals from the approval gate live there
//! too, where the gap list they carry is defined.

use thiserror::Error;

/// Errors caused by incoherent metric configuration.
///
/// These are programmer/configurator mistakes. They are surfaced as
/// errors and never silently mapped to a RAG status.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A DIRECTIONAL metric has no directional configuration.
    #[error("metric {metric_id} is DIRECTIONAL but has no directional config (lookback/allowed change/trend)")]
    MissingDirectionalConfig {
        /// The misconfigured metric.
        metric_id: String,
    },

    /// A DIRECTIONAL metric with a zero or negative lookback window.
    #[error("metric {metric_id} has non-positive lookback window of {lookback_days} days")]
    InvalidLookbackWindow {
        /// The misconfigured metric.
        metric_id: String,
        /// The rejected window length.
        lookback_days: i64,
    },
}

/// Errors during governance or breach lifecycle state transitions.
#[derive(Error, Debug)]
pub enum TransitionError {
    /// The attempted transition is not valid from the current status.
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// The current status name.
        from: String,
        /// The attempted target status name.
        to: String,
        /// Human-readable reason for the rejection.
        reason: String,
    },
}

/// Persistence layer failures, kept distinct from business-rule
/// refusals so a caller can distinguish "fix your configuration" from
/// "please retry".
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or the operation failed transiently.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The requested row does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// The entity kind (e.g., "metric", "statement").
        entity: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A concurrent writer invalidated this operation.
    #[error("write conflict: {0}")]
    Conflict(String),

    /// The operation exceeded its deadline.
    #[error("store operation timed out: {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
    },
}
