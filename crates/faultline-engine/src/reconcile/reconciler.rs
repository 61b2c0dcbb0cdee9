//! The reconcile sweep.
//!
//! Two phases. The read phase loads every mask and, per masked unit, that
//! unit's latest snapshot fresh from storage, and decides which masks have
//! positive evidence of resolution. The write phase deletes exactly those
//! masks in one transaction. If the time budget runs out during the read
//! phase nothing is deleted and the sweep fails.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use faultline_core::config::{AbsentFieldPolicy, ReconcileConfig};
use faultline_core::traits::IFaultStorage;
use faultline_core::{ClockPolicy, MaskRecord, MaskResolution, Snapshot};

use super::guard::ReconcileGuard;
use crate::errors::{FaultError, FaultResult};

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Masks evaluated.
    pub examined: usize,
    /// Masks deleted.
    pub cleared: usize,
    /// Masks whose fault is still true (or absent under the retain policy).
    pub retained: usize,
    /// Masks on units with no snapshot at all.
    pub skipped_no_snapshot: usize,
    /// Masks newer than their unit's latest snapshot.
    pub skipped_stale: usize,
    /// Masks whose field held a non-boolean value.
    pub malformed: usize,
    /// Resolved masks that were re-issued before the delete ran.
    pub superseded: usize,
    pub duration_ms: u64,
}

/// Decision for a single mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaskVerdict {
    /// Positive evidence of resolution at `observed_at`.
    Resolved { observed_at: DateTime<Utc> },
    Retained,
    NoSnapshot,
    Stale,
    Malformed,
}

/// Decide one mask against its unit's latest snapshot.
///
/// Silence is not resolution: without a snapshot at least as recent as the
/// mask, the mask stays.
pub fn evaluate_mask(
    mask: &MaskRecord,
    latest: Option<&Snapshot>,
    clock: ClockPolicy,
    absent_field: AbsentFieldPolicy,
) -> MaskVerdict {
    let Some(snapshot) = latest else {
        return MaskVerdict::NoSnapshot;
    };
    let observed_at = snapshot.captured_at(clock);
    if observed_at < mask.masked_at {
        return MaskVerdict::Stale;
    }
    match snapshot.field(&mask.fault_code) {
        Some(Value::Bool(true)) => MaskVerdict::Retained,
        Some(Value::Bool(false)) => MaskVerdict::Resolved { observed_at },
        None | Some(Value::Null) => match absent_field {
            AbsentFieldPolicy::Resolve => MaskVerdict::Resolved { observed_at },
            AbsentFieldPolicy::Retain => MaskVerdict::Retained,
        },
        Some(_) => MaskVerdict::Malformed,
    }
}

pub struct Reconciler {
    storage: Arc<dyn IFaultStorage>,
    budget: Duration,
    absent_field: AbsentFieldPolicy,
    guard: ReconcileGuard,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn IFaultStorage>, config: &ReconcileConfig) -> Self {
        Self {
            storage,
            budget: config.budget(),
            absent_field: config.absent_field,
            guard: ReconcileGuard::new(config.min_interval()),
        }
    }

    pub fn guard(&self) -> &ReconcileGuard {
        &self.guard
    }

    pub fn absent_field(&self) -> AbsentFieldPolicy {
        self.absent_field
    }

    /// Run a sweep unless the guard says one ran recently.
    /// Returns `None` when skipped.
    pub fn reconcile_if_due(&self, deadline: Option<Instant>) -> FaultResult<Option<ReconcileOutcome>> {
        if !self.guard.is_due(Instant::now()) {
            debug!(min_interval_ms = self.guard.min_interval().as_millis() as u64, "Reconcile skipped by interval guard");
            return Ok(None);
        }
        self.reconcile(deadline).map(Some)
    }

    /// Run one full sweep, bounded by the configured budget and `deadline`,
    /// whichever comes first.
    pub fn reconcile(&self, deadline: Option<Instant>) -> FaultResult<ReconcileOutcome> {
        let start = Instant::now();
        let limit = [deadline, start.checked_add(self.budget)]
            .into_iter()
            .flatten()
            .min();
        let clock = self.storage.clock();
        let mut outcome = ReconcileOutcome::default();

        self.check_deadline(limit)?;
        let masks = self
            .storage
            .list_masks()
            .map_err(FaultError::storage("list_masks"))?;

        let mut by_unit: BTreeMap<&str, Vec<&MaskRecord>> = BTreeMap::new();
        for mask in &masks {
            by_unit.entry(mask.unit_key.as_str()).or_default().push(mask);
        }

        let mut resolutions = Vec::new();
        for (unit_key, unit_masks) in by_unit {
            self.check_deadline(limit)?;
            let latest = self
                .storage
                .latest_snapshot_for_unit(unit_key)
                .map_err(FaultError::storage("latest_snapshot_for_unit"))?;

            for mask in unit_masks {
                outcome.examined += 1;
                match evaluate_mask(mask, latest.as_ref(), clock, self.absent_field) {
                    MaskVerdict::Resolved { observed_at } => resolutions.push(MaskResolution {
                        unit_key: mask.unit_key.clone(),
                        fault_code: mask.fault_code.clone(),
                        observed_at,
                    }),
                    MaskVerdict::Retained => outcome.retained += 1,
                    MaskVerdict::NoSnapshot => outcome.skipped_no_snapshot += 1,
                    MaskVerdict::Stale => outcome.skipped_stale += 1,
                    MaskVerdict::Malformed => {
                        warn!(unit_key, fault_code = %mask.fault_code, "Masked field is not boolean, keeping mask");
                        outcome.malformed += 1;
                    }
                }
            }
        }

        self.check_deadline(limit)?;
        if !resolutions.is_empty() {
            outcome.cleared = self
                .storage
                .delete_resolved_masks(&resolutions)
                .map_err(FaultError::storage("delete_resolved_masks"))?;
            outcome.superseded = resolutions.len() - outcome.cleared.min(resolutions.len());
        }

        let finished = Instant::now();
        outcome.duration_ms = finished.duration_since(start).as_millis() as u64;
        self.guard.record_success(finished);

        if outcome.cleared > 0 {
            info!(
                examined = outcome.examined,
                cleared = outcome.cleared,
                retained = outcome.retained,
                skipped_stale = outcome.skipped_stale,
                skipped_no_snapshot = outcome.skipped_no_snapshot,
                duration_ms = outcome.duration_ms,
                "Reconcile cleared resolved masks"
            );
        } else {
            debug!(examined = outcome.examined, duration_ms = outcome.duration_ms, "Reconcile complete");
        }
        Ok(outcome)
    }

    fn check_deadline(&self, limit: Option<Instant>) -> FaultResult<()> {
        if limit.is_some_and(|l| Instant::now() > l) {
            warn!(budget_ms = self.budget.as_millis() as u64, "Reconcile exceeded its deadline, nothing applied");
            return Err(FaultError::DeadlineExceeded {
                phase: "reconcile",
                budget_ms: self.budget.as_millis() as u64,
            });
        }
        Ok(())
    }
}
