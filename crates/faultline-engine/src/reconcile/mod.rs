//! Mask reconciliation: remove suppressions whose fault has physically cleared.

pub mod guard;
pub mod reconciler;

pub use guard::ReconcileGuard;
pub use reconciler::{evaluate_mask, MaskVerdict, ReconcileOutcome, Reconciler};
