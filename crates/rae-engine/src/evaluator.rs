//! # Threshold Evaluator
//!
//! Pure classification of a single observed value against a metric's
//! configured limits. Produces a fresh [`ThresholdEvaluationResult`] on
//! every call; nothing here is cached or persisted.
//!
//! ## Null Bounds
//!
//! Every bound is checked behind an explicit `Option` guard. A `None`
//! bound means "no boundary on that side" — it is never compared as `0`
//! and never skipped silently.
//!
//! ## Data Availability vs. Configuration
//!
//! Absence of data (no baseline inside the lookback window, a zero
//! baseline that would divide by zero) is a routine business condition
//! and maps to [`RagStatus::Unknown`]. An incoherent configuration (a
//! DIRECTIONAL metric without directional config) is a programmer error
//! and maps to [`EvaluationError`] — never to a status.

use thiserror::Error;

use rae_core::{
    ConfigurationError, RagStatus, StoreError, ThresholdBands, Timestamp, ToleranceMetric,
    TrendPolarity,
};
use rae_store::IndicatorStore;

use serde::{Deserialize, Serialize};

/// Why an evaluation could not produce a verdict at all.
///
/// Distinct from UNKNOWN: these are faults, not data gaps.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// The metric's configuration is incoherent.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The indicator store failed while fetching the lookback baseline.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The ephemeral verdict for one metric evaluation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEvaluationResult {
    /// The classified status.
    pub status: RagStatus,
    /// Human-readable description of the threshold band the verdict
    /// relates to (e.g., `"80 to 100"`).
    pub threshold: String,
    /// Why the status was assigned.
    pub explanation: String,
    /// The value that was evaluated.
    pub observed_value: f64,
    /// The numeric bound that was crossed, carried into the breach
    /// ledger as `threshold_value`. Absent on GREEN and UNKNOWN, where
    /// no ledger row is ever written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_value: Option<f64>,
    /// Signed percentage change against the lookback baseline.
    /// Present only for DIRECTIONAL metrics with a usable baseline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
}

impl ThresholdEvaluationResult {
    fn breach(
        status: RagStatus,
        threshold: String,
        explanation: String,
        observed: f64,
        crossed: f64,
    ) -> Self {
        Self {
            status,
            threshold,
            explanation,
            observed_value: observed,
            threshold_value: Some(crossed),
            change_pct: None,
        }
    }

    fn plain(status: RagStatus, threshold: String, explanation: String, observed: f64) -> Self {
        Self {
            status,
            threshold,
            explanation,
            observed_value: observed,
            threshold_value: None,
            change_pct: None,
        }
    }
}

/// Evaluate one metric against an observed value, as of `now`.
///
/// `history` is consulted only for DIRECTIONAL metrics, to fetch the
/// most recent observation at-or-before `now − lookback_days`.
pub fn evaluate(
    metric: &ToleranceMetric,
    observed: f64,
    history: &dyn IndicatorStore,
    now: Timestamp,
) -> Result<ThresholdEvaluationResult, EvaluationError> {
    // Exhaustive on MetricKind: an unsupported kind cannot exist.
    match metric.kind {
        rae_core::MetricKind::Range => Ok(evaluate_range(&metric.bands, observed)),
        rae_core::MetricKind::Maximum => Ok(evaluate_maximum(&metric.bands, observed)),
        rae_core::MetricKind::Minimum => Ok(evaluate_minimum(&metric.bands, observed)),
        rae_core::MetricKind::Directional => evaluate_directional(metric, observed, history, now),
    }
}

fn fmt(v: f64) -> String {
    format!("{v}")
}

/// RANGE: red outside `[red_min, red_max]`, else amber outside
/// `[amber_min, amber_max]`, else green. Either side of either band may
/// be absent, meaning unbounded on that side.
fn evaluate_range(bands: &ThresholdBands, observed: f64) -> ThresholdEvaluationResult {
    if let Some(red_min) = bands.red_min {
        if observed < red_min {
            return ThresholdEvaluationResult::breach(
                RagStatus::Red,
                format!("below {}", fmt(red_min)),
                format!("observed {} is below the red minimum {}", fmt(observed), fmt(red_min)),
                observed,
                red_min,
            );
        }
    }
    if let Some(red_max) = bands.red_max {
        if observed > red_max {
            return ThresholdEvaluationResult::breach(
                RagStatus::Red,
                format!("above {}", fmt(red_max)),
                format!("observed {} is above the red maximum {}", fmt(observed), fmt(red_max)),
                observed,
                red_max,
            );
        }
    }
    if let Some(amber_min) = bands.amber_min {
        if observed < amber_min {
            let threshold = match bands.red_min {
                Some(red_min) => format!("{} to {}", fmt(red_min), fmt(amber_min)),
                None => format!("below {}", fmt(amber_min)),
            };
            return ThresholdEvaluationResult::breach(
                RagStatus::Amber,
                threshold,
                format!(
                    "observed {} is below the amber minimum {}",
                    fmt(observed),
                    fmt(amber_min)
                ),
                observed,
                amber_min,
            );
        }
    }
    if let Some(amber_max) = bands.amber_max {
        if observed > amber_max {
            let threshold = match bands.red_max {
                Some(red_max) => format!("{} to {}", fmt(amber_max), fmt(red_max)),
                None => format!("above {}", fmt(amber_max)),
            };
            return ThresholdEvaluationResult::breach(
                RagStatus::Amber,
                threshold,
                format!(
                    "observed {} is above the amber maximum {}",
                    fmt(observed),
                    fmt(amber_max)
                ),
                observed,
                amber_max,
            );
        }
    }
    ThresholdEvaluationResult::plain(
        RagStatus::Green,
        describe_green_range(bands),
        format!("observed {} is within tolerance", fmt(observed)),
        observed,
    )
}

fn describe_green_range(bands: &ThresholdBands) -> String {
    match (bands.amber_min, bands.amber_max) {
        (Some(lo), Some(hi)) => format!("{} to {}", fmt(lo), fmt(hi)),
        (Some(lo), None) => format!("at or above {}", fmt(lo)),
        (None, Some(hi)) => format!("at or below {}", fmt(hi)),
        (None, None) => "unbounded".to_string(),
    }
}

/// MAXIMUM (lower is better): red above `red_max`, amber above
/// `amber_max`, else green.
fn evaluate_maximum(bands: &ThresholdBands, observed: f64) -> ThresholdEvaluationResult {
    if let Some(red_max) = bands.red_max {
        if observed > red_max {
            return ThresholdEvaluationResult::breach(
                RagStatus::Red,
                format!("above {}", fmt(red_max)),
                format!("observed {} is above the red maximum {}", fmt(observed), fmt(red_max)),
                observed,
                red_max,
            );
        }
    }
    if let Some(amber_max) = bands.amber_max {
        if observed > amber_max {
            let threshold = match bands.red_max {
                Some(red_max) => format!("{} to {}", fmt(amber_max), fmt(red_max)),
                None => format!("above {}", fmt(amber_max)),
            };
            return ThresholdEvaluationResult::breach(
                RagStatus::Amber,
                threshold,
                format!(
                    "observed {} is above the amber maximum {}",
                    fmt(observed),
                    fmt(amber_max)
                ),
                observed,
                amber_max,
            );
        }
    }
    let green_bound = bands.amber_max.or(bands.red_max);
    ThresholdEvaluationResult::plain(
        RagStatus::Green,
        match green_bound {
            Some(b) => format!("at or below {}", fmt(b)),
            None => "unbounded".to_string(),
        },
        format!("observed {} is within tolerance", fmt(observed)),
        observed,
    )
}

/// MINIMUM (higher is better): red below `red_min`, amber below
/// `amber_min`, else green.
fn evaluate_minimum(bands: &ThresholdBands, observed: f64) -> ThresholdEvaluationResult {
    if let Some(red_min) = bands.red_min {
        if observed < red_min {
            return ThresholdEvaluationResult::breach(
                RagStatus::Red,
                format!("below {}", fmt(red_min)),
                format!("observed {} is below the red minimum {}", fmt(observed), fmt(red_min)),
                observed,
                red_min,
            );
        }
    }
    if let Some(amber_min) = bands.amber_min {
        if observed < amber_min {
            let threshold = match bands.red_min {
                Some(red_min) => format!("{} to {}", fmt(red_min), fmt(amber_min)),
                None => format!("below {}", fmt(amber_min)),
            };
            return ThresholdEvaluationResult::breach(
                RagStatus::Amber,
                threshold,
                format!(
                    "observed {} is below the amber minimum {}",
                    fmt(observed),
                    fmt(amber_min)
                ),
                observed,
                amber_min,
            );
        }
    }
    let green_bound = bands.amber_min.or(bands.red_min);
    ThresholdEvaluationResult::plain(
        RagStatus::Green,
        match green_bound {
            Some(b) => format!("at or above {}", fmt(b)),
            None => "unbounded".to_string(),
        },
        format!("observed {} is within tolerance", fmt(observed)),
        observed,
    )
}

/// DIRECTIONAL: classify the signed percentage change against the
/// baseline fetched at `now − lookback_days`.
fn evaluate_directional(
    metric: &ToleranceMetric,
    observed: f64,
    history: &dyn IndicatorStore,
    now: Timestamp,
) -> Result<ThresholdEvaluationResult, EvaluationError> {
    let config = metric
        .directional
        .ok_or_else(|| ConfigurationError::MissingDirectionalConfig {
            metric_id: metric.id.to_string(),
        })?;
    if config.lookback_days <= 0 {
        return Err(ConfigurationError::InvalidLookbackWindow {
            metric_id: metric.id.to_string(),
            lookback_days: config.lookback_days,
        }
        .into());
    }
    let band = format!(
        "within {}% over {} days",
        fmt(config.allowed_change_pct),
        config.lookback_days
    );

    let Some(indicator_id) = metric.indicator_id else {
        return Ok(ThresholdEvaluationResult::plain(
            RagStatus::Unknown,
            band,
            "no indicator linked".to_string(),
            observed,
        ));
    };

    let baseline_at = now.days_before(config.lookback_days);
    let Some(baseline) = history.value_as_of(&indicator_id, baseline_at)? else {
        return Ok(ThresholdEvaluationResult::plain(
            RagStatus::Unknown,
            band,
            "insufficient history: no observation inside the lookback window".to_string(),
            observed,
        ));
    };

    // Guard the division: a zero baseline yields no meaningful change
    // percentage, not an Infinity/NaN.
    if baseline.value == 0.0 {
        return Ok(ThresholdEvaluationResult::plain(
            RagStatus::Unknown,
            band,
            "zero baseline: change percentage is undefined".to_string(),
            observed,
        ));
    }

    let change_pct = (observed - baseline.value) / baseline.value * 100.0;
    let adverse = match config.trend {
        TrendPolarity::IncreasingIsBad => change_pct > 0.0,
        TrendPolarity::DecreasingIsBad => change_pct < 0.0,
    };

    let status = if !adverse {
        RagStatus::Green
    } else if change_pct.abs() > 2.0 * config.allowed_change_pct {
        RagStatus::Red
    } else if change_pct.abs() > config.allowed_change_pct {
        RagStatus::Amber
    } else {
        RagStatus::Green
    };

    let explanation = format!(
        "changed {:+.1}% from baseline {} over {} days ({})",
        change_pct,
        fmt(baseline.value),
        config.lookback_days,
        if adverse { "adverse" } else { "favorable or flat" },
    );

    // For the ledger, the crossed bound is the allowance itself (amber)
    // or twice the allowance (red), expressed in percent.
    let threshold_value = match status {
        RagStatus::Amber => Some(config.allowed_change_pct),
        RagStatus::Red => Some(2.0 * config.allowed_change_pct),
        RagStatus::Green | RagStatus::Unknown => None,
    };

    Ok(ThresholdEvaluationResult {
        status,
        threshold: band,
        explanation,
        observed_value: observed,
        threshold_value,
        change_pct: Some(change_pct),
    })
}
