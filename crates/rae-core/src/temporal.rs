//! # Temporal Types
//!
//! UTC-only timestamp type plus the single freshness predicate for
//! indicator data.
//!
//! ## Design Decision
//!
//! Tolerance metrics are evaluated against indicator observations recorded
//! by systems in different local time zones. To prevent ambiguity in
//! detection timestamps and audit trails, all timestamps are UTC. Local
//! time conversion is a presentation concern handled by callers.
//!
//! [`FreshnessWindow`] exists because the chain validator's staleness
//! check and the approval gate's activation check enforce the same 90-day
//! rule. Both consume this one predicate so the two paths cannot silently
//! diverge.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A UTC timestamp with second-level precision.
///
/// Serializes to ISO 8601 with `Z` suffix (e.g., `2026-01-15T12:00:00Z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// The timestamp that is `days` whole days before this one.
    pub fn days_before(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Return the timestamp as an ISO 8601 string with Z suffix,
    /// truncated to seconds.
    pub fn to_canonical_string(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// How recent an indicator observation must be for a metric to count as
/// monitored.
///
/// Used by the chain validator (staleness is a WARNING gap) and by the
/// approval gate (staleness blocks metric activation). Both paths share
/// this type so a change to the window changes both at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessWindow {
    /// Maximum age of the most recent observation, in days.
    pub max_age_days: i64,
}

impl FreshnessWindow {
    /// The governance default: observations older than 90 days are stale.
    pub const DEFAULT: FreshnessWindow = FreshnessWindow { max_age_days: 90 };

    /// Create a window with a custom maximum age.
    pub fn new(max_age_days: i64) -> Self {
        Self { max_age_days }
    }

    /// Whether an observation made at `observed_at` is fresh as of `now`.
    ///
    /// Observations exactly at the boundary are fresh; future-dated
    /// observations (clock skew between reporting systems) are fresh too.
    pub fn is_fresh(&self, observed_at: Timestamp, now: Timestamp) -> bool {
        observed_at >= now.days_before(self.max_age_days)
    }
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn canonical_string_has_z_suffix() {
        let t = ts(2026, 1, 15);
        assert_eq!(t.to_canonical_string(), "2026-01-15T12:00:00Z");
    }

    #[test]
    fn days_before_subtracts_whole_days() {
        let t = ts(2026, 3, 31);
        assert_eq!(t.days_before(90), ts(2025, 12, 31));
    }

    #[test]
    fn fresh_inside_window() {
        let now = ts(2026, 6, 1);
        assert!(FreshnessWindow::DEFAULT.is_fresh(ts(2026, 5, 1), now));
    }

    #[test]
    fn stale_outside_window() {
        let now = ts(2026, 6, 1);
        assert!(!FreshnessWindow::DEFAULT.is_fresh(ts(2025, 1, 1), now));
    }

    #[test]
    fn boundary_observation_is_fresh() {
        let now = ts(2026, 6, 1);
        let boundary = now.days_before(90);
        assert!(FreshnessWindow::DEFAULT.is_fresh(boundary, now));
    }

    #[test]
    fn future_dated_observation_is_fresh() {
        let now = ts(2026, 6, 1);
        assert!(FreshnessWindow::DEFAULT.is_fresh(ts(2026, 6, 2), now));
    }

    #[test]
    fn custom_window() {
        let now = ts(2026, 6, 11);
        let window = FreshnessWindow::new(7);
        assert!(window.is_fresh(ts(2026, 6, 5), now));
        assert!(!window.is_fresh(ts(2026, 6, 1), now));
    }
}
