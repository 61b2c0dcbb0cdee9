//! Storage subsystem configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding snapshots, events, and masks. In-memory when `None`.
    pub database_path: Option<String>,
    /// Number of read-only connections next to the single writer.
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            read_pool_size: 2,
        }
    }
}
