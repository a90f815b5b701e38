//! # Batch Sweep
//!
//! Nightly-style re-evaluation of every active metric for an
//! organization. Metrics are independent, so the sweep fans out over a
//! bounded pool of scoped worker threads, one chunk per worker.
//!
//! Cancellation is cooperative and checked between metrics only — never
//! mid-metric — so a ledger write is always either fully applied or not
//! started. A cancelled sweep reports how much it skipped.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use rae_core::{OrgId, RagStatus, StoreError, Timestamp, ToleranceMetric};
use rae_engine::{evaluate, StatusCounts};
use rae_ledger::LedgerOutcome;

use crate::engine::{AppetiteEngine, EngineError};

/// Cooperative cancellation handle shared between the sweep caller and
/// its workers. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Workers stop before their next metric.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome summary of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Metrics evaluated to completion.
    pub evaluated: usize,
    /// Metrics skipped because cancellation was requested.
    pub skipped: usize,
    /// Ledger rows opened or escalated during the sweep.
    pub breaches_recorded: usize,
    /// Status tally over the evaluated metrics.
    pub counts: StatusCounts,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.evaluated += other.evaluated;
        self.skipped += other.skipped;
        self.breaches_recorded += other.breaches_recorded;
        self.counts.green += other.counts.green;
        self.counts.amber += other.counts.amber;
        self.counts.red += other.counts.red;
        self.counts.unknown += other.counts.unknown;
    }
}

impl AppetiteEngine {
    /// Re-evaluate every active metric for `org_id` and record the
    /// outcomes against the breach ledger, fanned out over at most
    /// `workers` threads.
    ///
    /// Size `workers` to the persistence layer's connection budget; it
    /// is clamped to at least one.
    pub fn sweep(
        &self,
        org_id: &OrgId,
        now: Timestamp,
        cancel: &CancelFlag,
        workers: usize,
    ) -> Result<SweepReport, EngineError> {
        let metrics = self.config.active_metrics(org_id)?;
        if metrics.is_empty() {
            return Ok(SweepReport::default());
        }
        let workers = workers.max(1).min(metrics.len());
        let chunk_size = metrics.len().div_ceil(workers);
        let breach_count = AtomicUsize::new(0);

        let report = std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(workers);
            for chunk in metrics.chunks(chunk_size) {
                let breach_count = &breach_count;
                handles.push(scope.spawn(move || -> Result<SweepReport, EngineError> {
                    let mut part = SweepReport::default();
                    for metric in chunk {
                        if cancel.is_cancelled() {
                            part.skipped += 1;
                            continue;
                        }
                        let status = self.sweep_metric(metric, now, breach_count)?;
                        part.evaluated += 1;
                        match status {
                            RagStatus::Green => part.counts.green += 1,
                            RagStatus::Amber => part.counts.amber += 1,
                            RagStatus::Red => part.counts.red += 1,
                            RagStatus::Unknown => part.counts.unknown += 1,
                        }
                    }
                    Ok(part)
                }));
            }

            let mut merged = SweepReport::default();
            for handle in handles {
                let part = handle.join().map_err(|_| {
                    EngineError::Store(StoreError::Unavailable(
                        "sweep worker panicked".to_string(),
                    ))
                })??;
                merged.merge(part);
            }
            Ok::<SweepReport, EngineError>(merged)
        })?;

        let mut report = report;
        report.breaches_recorded = breach_count.load(Ordering::SeqCst);
        tracing::info!(
            org_id = %org_id,
            evaluated = report.evaluated,
            skipped = report.skipped,
            breaches_recorded = report.breaches_recorded,
            "sweep finished"
        );
        Ok(report)
    }

    /// Evaluate one metric's latest value and record the outcome.
    /// Metrics with no indicator or no data count as UNKNOWN without
    /// touching the ledger.
    fn sweep_metric(
        &self,
        metric: &ToleranceMetric,
        now: Timestamp,
        breach_count: &AtomicUsize,
    ) -> Result<RagStatus, EngineError> {
        let Some(indicator_id) = metric.indicator_id else {
            return Ok(RagStatus::Unknown);
        };
        let Some(latest) = self.indicators.latest_value(&indicator_id)? else {
            return Ok(RagStatus::Unknown);
        };
        let verdict = evaluate(metric, latest.value, &*self.indicators, now)?;
        let outcome = self
            .tracker
            .record_observation(metric, &verdict, latest.observed_at)?;
        if matches!(
            outcome,
            LedgerOutcome::Opened(_) | LedgerOutcome::Escalated { .. }
        ) {
            breach_count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(verdict.status)
    }
}
