//! # RAG Status Lattice
//!
//! Defines [`RagStatus`], the GREEN/AMBER/RED/UNKNOWN vocabulary used for
//! every threshold verdict and every roll-up in the engine, together with
//! the single worst-case-wins reducer.
//!
//! The precedence order is fixed:
//!
//! ```text
//! Severity (worst → best): Red > Amber > Unknown > Green
//!
//! worst(a, b) = max severity — pessimistic (one bad signal taints the whole)
//! ```
//!
//! `Unknown` outranking `Green` is deliberate: absence of monitoring is
//! not evidence of safety, so an all-green set with one unmonitored metric
//! rolls up to `Unknown`, and an empty set rolls up to `Unknown` as well.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::breach::BreachSeverity;

/// A traffic-light status for one metric, category, or the enterprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    /// Within tolerance.
    Green,
    /// Outside the amber band but inside the red band.
    Amber,
    /// Outside the red band.
    Red,
    /// No verdict possible: no data, no baseline, or nothing monitored.
    Unknown,
}

impl RagStatus {
    /// Severity rank. Higher is worse.
    fn severity(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Unknown => 1,
            Self::Amber => 2,
            Self::Red => 3,
        }
    }

    /// Worst-case composition of two statuses.
    ///
    /// `Red` is absorbing: `worst(x, Red) == Red` for all x.
    pub fn worst(self, other: Self) -> Self {
        if self.severity() >= other.severity() {
            self
        } else {
            other
        }
    }

    /// Reduce a sequence of statuses to a single roll-up status.
    ///
    /// Applied identically at metric→category and category→enterprise
    /// level: any RED ⇒ RED; else any AMBER ⇒ AMBER; else any UNKNOWN ⇒
    /// UNKNOWN; else GREEN. An **empty** sequence yields `Unknown`, never
    /// `Green`.
    pub fn worst_of(statuses: impl IntoIterator<Item = RagStatus>) -> RagStatus {
        statuses
            .into_iter()
            .fold(None, |acc: Option<RagStatus>, s| {
                Some(acc.map_or(s, |a| a.worst(s)))
            })
            .unwrap_or(RagStatus::Unknown)
    }

    /// Map a breach-grade status to its ledger severity.
    ///
    /// Returns `None` for `Green` and `Unknown`, which never open a
    /// ledger entry.
    pub fn breach_severity(self) -> Option<BreachSeverity> {
        match self {
            Self::Amber => Some(BreachSeverity::Amber),
            Self::Red => Some(BreachSeverity::Red),
            Self::Green | Self::Unknown => None,
        }
    }
}

impl PartialOrd for RagStatus {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RagStatus {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for RagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => f.write_str("GREEN"),
            Self::Amber => f.write_str("AMBER"),
            Self::Red => f.write_str("RED"),
            Self::Unknown => f.write_str("UNKNOWN"),
        }
    }
}
