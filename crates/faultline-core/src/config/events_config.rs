//! Event listing configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Upper bound on raw event rows fetched per range query.
    pub max_rows: usize,
    /// Snapshots returned by the group detail view.
    pub detail_limit: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            max_rows: 500,
            detail_limit: 8,
        }
    }
}
