//! Mask reconciliation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What a missing fault field in the latest snapshot means for its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsentFieldPolicy {
    /// Absent counts as resolved and clears the mask.
    #[default]
    Resolve,
    /// Absent is not evidence; the mask stays until an explicit `false`.
    Retain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Hard time budget for one reconcile sweep.
    pub budget_ms: u64,
    /// Skip a sweep if the previous successful one finished within this window.
    /// Zero reconciles on every read.
    pub min_interval_ms: u64,
    pub absent_field: AbsentFieldPolicy,
}

impl ReconcileConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            budget_ms: 5_000,
            min_interval_ms: 0,
            absent_field: AbsentFieldPolicy::Resolve,
        }
    }
}
