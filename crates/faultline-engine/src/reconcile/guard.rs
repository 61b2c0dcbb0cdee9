//! Minimum-interval guard for reconcile-before-read.
//!
//! Aggregate reads can arrive far faster than telemetry changes. The guard
//! lets a read skip the sweep when another one finished successfully within
//! `min_interval`. Explicit `reconcile()` calls never consult it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const NEVER: u64 = u64::MAX;

pub struct ReconcileGuard {
    min_interval: Duration,
    epoch: Instant,
    /// Millis since `epoch` of the last successful sweep, or `NEVER`.
    last_success_ms: AtomicU64,
}

impl ReconcileGuard {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            epoch: Instant::now(),
            last_success_ms: AtomicU64::new(NEVER),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether a read at `now` should reconcile first.
    pub fn is_due(&self, now: Instant) -> bool {
        if self.min_interval.is_zero() {
            return true;
        }
        match self.last_success_ms.load(Ordering::SeqCst) {
            NEVER => true,
            last => {
                let elapsed = self.millis_at(now).saturating_sub(last);
                Duration::from_millis(elapsed) >= self.min_interval
            }
        }
    }

    pub fn record_success(&self, at: Instant) {
        self.last_success_ms.store(self.millis_at(at), Ordering::SeqCst);
    }

    pub fn last_success(&self) -> Option<Instant> {
        match self.last_success_ms.load(Ordering::SeqCst) {
            NEVER => None,
            ms => Some(self.epoch + Duration::from_millis(ms)),
        }
    }

    /// Forget the last sweep so the next read reconciles.
    pub fn reset(&self) {
        self.last_success_ms.store(NEVER, Ordering::SeqCst);
    }

    fn millis_at(&self, at: Instant) -> u64 {
        let ms = at.saturating_duration_since(self.epoch).as_millis();
        u64::try_from(ms).unwrap_or(NEVER - 1).min(NEVER - 1)
    }
}

impl Default for ReconcileGuard {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}
