#![deny(missing_docs)]

//! # rae-store — Persistence Seam for the Risk Appetite Engine
//!
//! The engine treats its data store as an external collaborator offering
//! simple keyed read/write with row filters. This crate defines that
//! boundary as four traits:
//!
//! - [`ConfigStore`] — tolerance metric, appetite category, and statement
//!   rows. Writes are restricted to the approval gate's status fields.
//! - [`IndicatorStore`] — read access to Key Risk Indicator time series.
//! - [`BreachStore`] — the breach ledger. Written exclusively by the
//!   breach tracker.
//! - [`NotificationDispatcher`] — fire-and-forget escalation dispatch.
//!   Failures must never fail the breach-recording mutation.
//!
//! [`MemoryStore`] implements the first three over `parking_lot` maps and
//! is the test double for every downstream crate; [`RecordingDispatcher`]
//! and [`FailingDispatcher`] are the notification doubles.

pub mod memory;
pub mod traits;

pub use memory::{FailingDispatcher, MemoryStore, RecordingDispatcher};
pub use traits::{
    BreachStore, ConfigStore, DispatchError, EscalationNotice, IndicatorStore,
    NotificationDispatcher,
};
