//! Storage abstraction for the fault engine.
//!
//! The engine only ever talks to storage through these traits, so the SQLite
//! implementation can be swapped (or wrapped in tests) without touching the
//! reconciliation or aggregation code. Every method surfaces failures as
//! `StorageError`; nothing here retries.

use crate::clock::ClockPolicy;
use crate::errors::StorageError;
use crate::types::event::{EventFilter, FaultEvent, TimeRange};
use crate::types::mask::{MaskRecord, MaskResolution};
use crate::types::snapshot::Snapshot;

/// Read access to telemetry snapshots.
pub trait ISnapshotReader: Send + Sync {
    /// The clock this reader orders by. Fixed at construction.
    fn clock(&self) -> ClockPolicy;

    /// One row per distinct unit, newest under the active clock.
    fn latest_snapshot_per_unit(&self, group_key: Option<&str>) -> Result<Vec<Snapshot>, StorageError>;

    /// The newest snapshot of one unit, if any exists.
    fn latest_snapshot_for_unit(&self, unit_key: &str) -> Result<Option<Snapshot>, StorageError>;

    /// Most recent snapshots across all units of a group, newest first.
    fn recent_snapshots_for_group(
        &self,
        group_key: &str,
        limit: usize,
    ) -> Result<Vec<Snapshot>, StorageError>;
}

/// Read access to the append-only event log.
pub trait IEventLog: Send + Sync {
    /// Events whose active-clock time falls in `range`, newest first,
    /// capped at `limit` rows.
    fn raw_events_in_range(
        &self,
        range: &TimeRange,
        filter: &EventFilter,
        limit: usize,
    ) -> Result<Vec<FaultEvent>, StorageError>;
}

/// The durable suppression set. Owned exclusively by the engine.
pub trait ISuppressionStore: Send + Sync {
    /// Insert-if-absent. Returns `true` when a new row was written.
    fn insert_mask(&self, mask: &MaskRecord) -> Result<bool, StorageError>;

    fn list_masks(&self) -> Result<Vec<MaskRecord>, StorageError>;

    fn masks_for_unit(&self, unit_key: &str) -> Result<Vec<MaskRecord>, StorageError>;

    /// Delete every mask named in `resolutions` whose `masked_at` is not newer
    /// than the resolution's `observed_at`, in a single transaction.
    /// Returns the number of rows removed. Missing rows are not an error.
    fn delete_resolved_masks(&self, resolutions: &[MaskResolution]) -> Result<usize, StorageError>;
}

/// Write access used by the ingestion pipeline.
pub trait ITelemetryWriter: Send + Sync {
    /// Returns `true` if the snapshot was new.
    fn insert_snapshot(&self, snapshot: &Snapshot) -> Result<bool, StorageError>;

    /// Insert a batch in one transaction. Returns the number of new rows.
    fn insert_snapshots(&self, snapshots: &[Snapshot]) -> Result<usize, StorageError>;

    fn append_event(&self, event: &FaultEvent) -> Result<(), StorageError>;

    fn append_events(&self, events: &[FaultEvent]) -> Result<usize, StorageError>;
}

/// Connectivity report for health endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageHealth {
    pub connected: bool,
    pub wal_mode: bool,
    pub schema_version: u32,
}

/// Everything the engine needs from storage.
pub trait IFaultStorage: ISnapshotReader + IEventLog + ISuppressionStore {
    fn health(&self) -> StorageHealth;
}
