//! Operator suppression records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted mask: `(unit_key, fault_code)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskRecord {
    pub unit_key: String,
    pub fault_code: String,
    pub masked_at: DateTime<Utc>,
}

/// Positive evidence that a masked fault has cleared.
///
/// `observed_at` is the active-clock time of the snapshot that showed the
/// fault as not true. The store only deletes a mask whose `masked_at` is not
/// newer than this, so a mask re-issued after the observation survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskResolution {
    pub unit_key: String,
    pub fault_code: String,
    pub observed_at: DateTime<Utc>,
}
