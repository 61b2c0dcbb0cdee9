//! SqliteFaultStore: the concrete storage engine behind every storage trait.
//!
//! Each trait method delegates to a free function in `queries/`, routed
//! through the pool. Reads go to the reader pool; inserts, mask writes and
//! the reconciliation delete go through the single writer.

use std::path::Path;

use tracing::{debug, warn};

use faultline_core::traits::{
    IEventLog, IFaultStorage, ISnapshotReader, ISuppressionStore, ITelemetryWriter, StorageHealth,
};
use faultline_core::{
    ClockPolicy, EventFilter, FaultEvent, MaskRecord, MaskResolution, Snapshot, StorageError,
    TimeRange,
};

use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{events, masks, snapshots};
use crate::sqe;

/// SQLite-backed fault store. The clock policy is fixed for its lifetime.
pub struct SqliteFaultStore {
    pool: ConnectionPool,
    clock: ClockPolicy,
}

impl SqliteFaultStore {
    /// Open (creating if needed) a file-backed store.
    pub fn open(path: &Path, clock: ClockPolicy, read_pool_size: usize) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::OpenFailed {
                    path: path.display().to_string(),
                    message: format!("cannot create directory: {e}"),
                })?;
            }
        }
        let pool = ConnectionPool::open(path, read_pool_size)?;
        debug!(path = %path.display(), %clock, readers = pool.reader_count(), "Opened fault store");
        Ok(Self { pool, clock })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory(clock: ClockPolicy) -> Result<Self, StorageError> {
        let pool = ConnectionPool::open_in_memory()?;
        Ok(Self { pool, clock })
    }

    /// Execute a closure with the writer connection (tests and maintenance).
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, StorageError>,
    {
        self.pool.with_writer(f)
    }

    /// Execute a closure with a reader connection.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, StorageError>,
    {
        self.pool.with_reader(f)
    }

    pub fn snapshot_count(&self) -> Result<i64, StorageError> {
        self.pool.with_reader(snapshots::count_snapshots)
    }

    pub fn event_count(&self) -> Result<i64, StorageError> {
        self.pool.with_reader(events::count_events)
    }
}

impl ISnapshotReader for SqliteFaultStore {
    fn clock(&self) -> ClockPolicy {
        self.clock
    }

    fn latest_snapshot_per_unit(&self, group_key: Option<&str>) -> Result<Vec<Snapshot>, StorageError> {
        self.pool
            .with_reader(|conn| snapshots::latest_per_unit(conn, self.clock, group_key))
    }

    fn latest_snapshot_for_unit(&self, unit_key: &str) -> Result<Option<Snapshot>, StorageError> {
        self.pool
            .with_reader(|conn| snapshots::latest_for_unit(conn, self.clock, unit_key))
    }

    fn recent_snapshots_for_group(
        &self,
        group_key: &str,
        limit: usize,
    ) -> Result<Vec<Snapshot>, StorageError> {
        self.pool
            .with_reader(|conn| snapshots::recent_for_group(conn, self.clock, group_key, limit))
    }
}

impl IEventLog for SqliteFaultStore {
    fn raw_events_in_range(
        &self,
        range: &TimeRange,
        filter: &EventFilter,
        limit: usize,
    ) -> Result<Vec<FaultEvent>, StorageError> {
        self.pool
            .with_reader(|conn| events::events_in_range(conn, self.clock, range, filter, limit))
    }
}

impl ISuppressionStore for SqliteFaultStore {
    fn insert_mask(&self, mask: &MaskRecord) -> Result<bool, StorageError> {
        self.pool.with_writer(|conn| masks::insert_mask(conn, mask))
    }

    fn list_masks(&self) -> Result<Vec<MaskRecord>, StorageError> {
        self.pool.with_reader(masks::list_masks)
    }

    fn masks_for_unit(&self, unit_key: &str) -> Result<Vec<MaskRecord>, StorageError> {
        self.pool.with_reader(|conn| masks::masks_for_unit(conn, unit_key))
    }

    fn delete_resolved_masks(&self, resolutions: &[MaskResolution]) -> Result<usize, StorageError> {
        self.pool
            .with_writer(|conn| masks::delete_resolved(conn, resolutions))
    }
}

impl ITelemetryWriter for SqliteFaultStore {
    fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool, StorageError> {
        self.pool
            .with_writer(|conn| snapshots::insert_snapshot(conn, snapshot))
    }

    fn insert_snapshots(&self, batch: &[Snapshot]) -> Result<usize, StorageError> {
        self.pool.with_writer(|conn| {
            let tx = conn.unchecked_transaction().map_err(sqe)?;
            let mut inserted = 0;
            for snapshot in batch {
                if snapshots::insert_snapshot(&tx, snapshot)? {
                    inserted += 1;
                }
            }
            tx.commit().map_err(sqe)?;
            Ok(inserted)
        })
    }

    fn append_event(&self, event: &FaultEvent) -> Result<(), StorageError> {
        self.pool.with_writer(|conn| events::append_event(conn, event))
    }

    fn append_events(&self, batch: &[FaultEvent]) -> Result<usize, StorageError> {
        self.pool.with_writer(|conn| {
            let tx = conn.unchecked_transaction().map_err(sqe)?;
            for event in batch {
                events::append_event(&tx, event)?;
            }
            tx.commit().map_err(sqe)?;
            Ok(batch.len())
        })
    }
}

impl IFaultStorage for SqliteFaultStore {
    fn health(&self) -> StorageHealth {
        let connected = self
            .pool
            .with_reader(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).map_err(sqe))
            .is_ok();
        let schema_version = match self.pool.with_writer(migrations::get_schema_version) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Could not read schema version");
                0
            }
        };
        StorageHealth {
            connected,
            wal_mode: self.pool.is_wal_mode(),
            schema_version,
        }
    }
}
