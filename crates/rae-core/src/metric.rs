//! # Tolerance Metric Configuration
//!
//! The quantitative boundary types: metric kinds, nullable threshold
//! bands, directional trend configuration, and the [`ToleranceMetric`]
//! record itself.
//!
//! ## Nullable Bounds
//!
//! Every bound in [`ThresholdBands`] is independently `Option<f64>`. A
//! `None` bound means "no boundary on that side" — it must never be read
//! as `0` and never skipped silently. The evaluator guards each bound
//! explicitly.

use serde::{Deserialize, Serialize};

use crate::identity::{CategoryId, IndicatorId, MetricId, OrgId};
use crate::temporal::Timestamp;

/// The evaluation shape of a tolerance metric.
///
/// This enum is the single source of truth for metric kinds. Every
/// `match` on it is exhaustive, so an unsupported kind is a compile
/// error, not a runtime business-status outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Value must stay inside a band; breaches occur on either side.
    Range,
    /// Lower is better; breaches occur above the amber/red maxima.
    Maximum,
    /// Higher is better; breaches occur below the amber/red minima.
    Minimum,
    /// The rate of change over a lookback window is what matters.
    Directional,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range => f.write_str("RANGE"),
            Self::Maximum => f.write_str("MAXIMUM"),
            Self::Minimum => f.write_str("MINIMUM"),
            Self::Directional => f.write_str("DIRECTIONAL"),
        }
    }
}

/// Whether the metric matters to internal management, external
/// stakeholders (regulators, rating agencies), or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materiality {
    /// Internal management reporting only.
    Internal,
    /// Externally disclosed or regulator-facing.
    External,
    /// Both internal and external.
    Dual,
}

/// Which direction of change is adverse for a directional metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendPolarity {
    /// Growth is the risk signal (e.g., complaint volume).
    IncreasingIsBad,
    /// Decline is the risk signal (e.g., liquidity buffer).
    DecreasingIsBad,
}

/// The six independently nullable bounds of a metric.
///
/// Green bounds are descriptive (they render in threshold text); the
/// amber and red bounds drive classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBands {
    /// Lower green bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_min: Option<f64>,
    /// Upper green bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub green_max: Option<f64>,
    /// Lower amber bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amber_min: Option<f64>,
    /// Upper amber bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amber_max: Option<f64>,
    /// Lower red bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_min: Option<f64>,
    /// Upper red bound, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub red_max: Option<f64>,
}

/// Trend configuration for a DIRECTIONAL metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalConfig {
    /// How far back to fetch the baseline observation, in days.
    pub lookback_days: i64,
    /// The tolerated adverse change, in percent. Twice this is the red
    /// boundary.
    pub allowed_change_pct: f64,
    /// Which direction of change is adverse.
    pub trend: TrendPolarity,
}

/// A quantitative boundary on one measurable signal.
///
/// Invariant (enforced at activation time by the approval gate, not
/// continuously): an active metric has a non-null indicator link whose
/// indicator has at least one observation inside the freshness window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToleranceMetric {
    /// Unique metric identifier.
    pub id: MetricId,
    /// The owning organization.
    pub org_id: OrgId,
    /// The appetite category this metric operationalizes.
    pub category_id: CategoryId,
    /// Human-readable metric name.
    pub name: String,
    /// The evaluation shape.
    pub kind: MetricKind,
    /// Unit of measure for the observed value (e.g., `%`, `count`, `USD m`).
    pub unit: String,
    /// Who the metric matters to.
    pub materiality: Materiality,
    /// The nullable threshold bounds.
    pub bands: ThresholdBands,
    /// Trend configuration; required when `kind == Directional`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directional: Option<DirectionalConfig>,
    /// The indicator feeding this metric, if linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator_id: Option<IndicatorId>,
    /// Whether the metric participates in evaluation and roll-ups.
    pub is_active: bool,
    /// Reserved aggregation weight. Carried but not yet used in scoring.
    pub weight: f64,
}

impl ToleranceMetric {
    /// Minimal constructor used pervasively in tests and by the
    /// configuration layer: inactive, unlinked, unit-weight.
    pub fn new(
        org_id: OrgId,
        category_id: CategoryId,
        name: impl Into<String>,
        kind: MetricKind,
    ) -> Self {
        Self {
            id: MetricId::new(),
            org_id,
            category_id,
            name: name.into(),
            kind,
            unit: String::new(),
            materiality: Materiality::Internal,
            bands: ThresholdBands::default(),
            directional: None,
            indicator_id: None,
            is_active: false,
            weight: 1.0,
        }
    }
}

/// One observation in a Key Risk Indicator time series, as surfaced by
/// the indicator store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
    /// The indicator the observation belongs to.
    pub indicator_id: IndicatorId,
    /// The measured value.
    pub value: f64,
    /// When the value was observed.
    pub observed_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bands_are_all_unbounded() {
        let bands = ThresholdBands::default();
        assert!(bands.green_min.is_none());
        assert!(bands.green_max.is_none());
        assert!(bands.amber_min.is_none());
        assert!(bands.amber_max.is_none());
        assert!(bands.red_min.is_none());
        assert!(bands.red_max.is_none());
    }

    #[test]
    fn none_bounds_are_omitted_from_json() {
        let bands = ThresholdBands {
            amber_max: Some(80.0),
            red_max: Some(100.0),
            ..Default::default()
        };
        let json = serde_json::to_string(&bands).unwrap();
        assert_eq!(json, r#"{"amber_max":80.0,"red_max":100.0}"#);
    }

    #[test]
    fn new_metric_is_inactive_and_unlinked() {
        let metric = ToleranceMetric::new(
            OrgId::new(),
            CategoryId::new(),
            "Liquidity coverage",
            MetricKind::Minimum,
        );
        assert!(!metric.is_active);
        assert!(metric.indicator_id.is_none());
        assert_eq!(metric.weight, 1.0);
    }

    #[test]
    fn metric_kind_display_is_upper_snake() {
        assert_eq!(MetricKind::Directional.to_string(), "DIRECTIONAL");
        assert_eq!(MetricKind::Range.to_string(), "RANGE");
    }

    #[test]
    fn metric_serde_roundtrip() {
        let mut metric = ToleranceMetric::new(
            OrgId::new(),
            CategoryId::new(),
            "Complaint growth",
            MetricKind::Directional,
        );
        metric.directional = Some(DirectionalConfig {
            lookback_days: 30,
            allowed_change_pct: 10.0,
            trend: TrendPolarity::IncreasingIsBad,
        });
        let json = serde_json::to_string(&metric).unwrap();
        let back: ToleranceMetric = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, metric.id);
        assert_eq!(back.directional, metric.directional);
    }
}
