//! Reconciliation under adverse conditions: slow storage, expired deadlines,
//! masks re-issued mid-sweep, the interval guard and the ingest clock.

use std::sync::Arc;
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use chrono::{Duration, Utc};

use faultline_core::traits::{
    IEventLog, IFaultStorage, ISnapshotReader, ISuppressionStore, ITelemetryWriter, StorageHealth,
};
use faultline_core::{
    ClockPolicy, EventFilter, FaultEvent, FaultlineConfig, MaskRecord, MaskResolution, Snapshot,
    StorageError, TimeRange,
};
use faultline_engine::{FaultEngine, FaultError, FaultRegistry};
use faultline_storage::SqliteFaultStore;

// ============================================================================
// HELPERS
// ============================================================================

/// Wraps a real store and lets a test tamper with two calls.
struct TamperedStore {
    inner: Arc<SqliteFaultStore>,
    /// Added to every per-unit snapshot read.
    read_delay: StdDuration,
    /// Shifts `masked_at` of listed masks into the past, as if the list had
    /// been read just before an operator re-issued each mask.
    list_lag: Duration,
}

impl TamperedStore {
    fn new(inner: Arc<SqliteFaultStore>) -> Self {
        Self {
            inner,
            read_delay: StdDuration::ZERO,
            list_lag: Duration::zero(),
        }
    }
}

impl ISnapshotReader for TamperedStore {
    fn clock(&self) -> ClockPolicy {
        self.inner.clock()
    }

    fn latest_snapshot_per_unit(&self, group_key: Option<&str>) -> Result<Vec<Snapshot>, StorageError> {
        self.inner.latest_snapshot_per_unit(group_key)
    }

    fn latest_snapshot_for_unit(&self, unit_key: &str) -> Result<Option<Snapshot>, StorageError> {
        thread::sleep(self.read_delay);
        self.inner.latest_snapshot_for_unit(unit_key)
    }

    fn recent_snapshots_for_group(&self, group_key: &str, limit: usize) -> Result<Vec<Snapshot>, StorageError> {
        self.inner.recent_snapshots_for_group(group_key, limit)
    }
}

impl IEventLog for TamperedStore {
    fn raw_events_in_range(
        &self,
        range: &TimeRange,
        filter: &EventFilter,
        limit: usize,
    ) -> Result<Vec<FaultEvent>, StorageError> {
        self.inner.raw_events_in_range(range, filter, limit)
    }
}

impl ISuppressionStore for TamperedStore {
    fn insert_mask(&self, mask: &MaskRecord) -> Result<bool, StorageError> {
        self.inner.insert_mask(mask)
    }

    fn list_masks(&self) -> Result<Vec<MaskRecord>, StorageError> {
        let mut masks = self.inner.list_masks()?;
        for mask in &mut masks {
            mask.masked_at -= self.list_lag;
        }
        Ok(masks)
    }

    fn masks_for_unit(&self, unit_key: &str) -> Result<Vec<MaskRecord>, StorageError> {
        self.inner.masks_for_unit(unit_key)
    }

    fn delete_resolved_masks(&self, resolutions: &[MaskResolution]) -> Result<usize, StorageError> {
        self.inner.delete_resolved_masks(resolutions)
    }
}

impl IFaultStorage for TamperedStore {
    fn health(&self) -> StorageHealth {
        self.inner.health()
    }
}

fn engine_over(storage: Arc<dyn IFaultStorage>, config: &FaultlineConfig) -> FaultEngine {
    FaultEngine::new(storage, Arc::new(FaultRegistry::with_defaults()), config)
}

/// Two masked units whose latest snapshots both show the fault cleared.
fn seed_resolvable(store: &SqliteFaultStore) {
    let masked_at = Utc::now() - Duration::minutes(10);
    for unit in ["U1", "U2"] {
        store
            .insert_mask(&MaskRecord {
                unit_key: unit.into(),
                fault_code: "BfltFadU11".into(),
                masked_at,
            })
            .unwrap();
        store
            .insert_snapshot(&Snapshot::new(unit, "7002", 1, Utc::now()).with_field("BfltFadU11", false))
            .unwrap();
    }
}

// ============================================================================
// DEADLINES
// ============================================================================

#[test]
fn slow_reads_exceed_budget_and_apply_nothing() {
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
    seed_resolvable(&store);

    let mut config = FaultlineConfig::default();
    config.reconcile.budget_ms = 20;
    let mut slow = TamperedStore::new(store.clone());
    slow.read_delay = StdDuration::from_millis(60);
    let engine = engine_over(Arc::new(slow), &config);

    let err = engine.reconcile(None).unwrap_err();
    assert!(matches!(err, FaultError::DeadlineExceeded { budget_ms: 20, .. }));
    assert_eq!(store.list_masks().unwrap().len(), 2);
    assert!(engine.health().last_reconcile.is_none());

    // Aggregate reads fail as a whole rather than serving partial state.
    assert!(matches!(
        engine.get_group_summary(None).unwrap_err(),
        FaultError::DeadlineExceeded { .. }
    ));
}

#[test]
fn caller_deadline_in_the_past_applies_nothing() {
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
    seed_resolvable(&store);
    let engine = engine_over(store.clone(), &FaultlineConfig::default());

    let deadline = Instant::now();
    thread::sleep(StdDuration::from_millis(5));
    assert!(matches!(
        engine.reconcile(Some(deadline)).unwrap_err(),
        FaultError::DeadlineExceeded { .. }
    ));
    assert_eq!(store.list_masks().unwrap().len(), 2);

    let outcome = engine.reconcile(None).unwrap();
    assert_eq!(outcome.cleared, 2);
    assert!(store.list_masks().unwrap().is_empty());
}

// ============================================================================
// RE-ISSUED MASKS
// ============================================================================

#[test]
fn mask_reissued_after_observation_survives() {
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
    store
        .insert_snapshot(
            &Snapshot::new("U1", "7002", 1, Utc::now() - Duration::minutes(30)).with_field("BfltFadU11", false),
        )
        .unwrap();
    store
        .insert_mask(&MaskRecord {
            unit_key: "U1".into(),
            fault_code: "BfltFadU11".into(),
            masked_at: Utc::now(),
        })
        .unwrap();

    let mut lagging = TamperedStore::new(store.clone());
    lagging.list_lag = Duration::hours(1);
    let engine = engine_over(Arc::new(lagging), &FaultlineConfig::default());

    let outcome = engine.reconcile(None).unwrap();
    assert_eq!(outcome.examined, 1);
    assert_eq!(outcome.cleared, 0);
    assert_eq!(outcome.superseded, 1);
    assert_eq!(store.list_masks().unwrap().len(), 1);
}

// ============================================================================
// VERDICTS
// ============================================================================

#[test]
fn non_boolean_fault_value_keeps_mask() {
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
    let engine = engine_over(store.clone(), &FaultlineConfig::default());
    engine.mask_fault("U1", "BfltFadU11").unwrap();
    store
        .insert_snapshot(
            &Snapshot::new("U1", "7002", 1, Utc::now() + Duration::seconds(1)).with_field("BfltFadU11", "yes"),
        )
        .unwrap();

    let outcome = engine.reconcile(None).unwrap();
    assert_eq!(outcome.malformed, 1);
    assert_eq!(outcome.cleared, 0);
    assert_eq!(store.list_masks().unwrap().len(), 1);
    // The unit still shows up in its group.
    assert_eq!(engine.get_group_summary(None).unwrap()["7002"].total, 0);
}

#[test]
fn ingest_clock_ignores_device_time_for_staleness() {
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Ingest).unwrap());
    let mut config = FaultlineConfig::default();
    config.clock = ClockPolicy::Ingest;
    let engine = engine_over(store.clone(), &config);

    engine.mask_fault("U1", "BfltFadU11").unwrap();
    // Device clock runs an hour ahead; the pipeline received it earlier.
    store
        .insert_snapshot(
            &Snapshot::new("U1", "7002", 1, Utc::now() + Duration::hours(1))
                .with_ingest_time(Utc::now() - Duration::minutes(1))
                .with_field("BfltFadU11", false),
        )
        .unwrap();

    let outcome = engine.reconcile(None).unwrap();
    assert_eq!(outcome.skipped_stale, 1);
    assert_eq!(store.list_masks().unwrap().len(), 1);

    store
        .insert_snapshot(
            &Snapshot::new("U1", "7002", 1, Utc::now() - Duration::hours(1))
                .with_ingest_time(Utc::now() + Duration::seconds(1))
                .with_field("BfltFadU11", false),
        )
        .unwrap();
    assert_eq!(engine.reconcile(None).unwrap().cleared, 1);
}

// ============================================================================
// INTERVAL GUARD
// ============================================================================

#[test]
fn reads_within_min_interval_skip_reconcile() {
    let mut config = FaultlineConfig::default();
    config.reconcile.min_interval_ms = 60_000;
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
    let engine = engine_over(store.clone(), &config);

    engine.mask_fault("U1", "BfltFadU11").unwrap();
    engine.get_group_summary(None).unwrap();
    assert!(engine.health().last_reconcile.is_some());

    store
        .insert_snapshot(
            &Snapshot::new("U1", "7002", 1, Utc::now() + Duration::seconds(1)).with_field("BfltFadU11", false),
        )
        .unwrap();
    engine.get_group_summary(None).unwrap();
    assert_eq!(store.list_masks().unwrap().len(), 1);

    // Explicit sweeps never consult the guard.
    assert_eq!(engine.reconcile(None).unwrap().cleared, 1);
    assert!(store.list_masks().unwrap().is_empty());
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn concurrent_masks_and_sweeps() {
    let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
    let engine = engine_over(store.clone(), &FaultlineConfig::default());
    let codes = ["BfltFadU11", "BfltFadU12", "BfltRadU11", "BfltRadU12"];

    thread::scope(|s| {
        for code in codes {
            let engine = &engine;
            s.spawn(move || {
                for _ in 0..10 {
                    engine.mask_fault("U1", code).unwrap();
                }
            });
        }
        s.spawn(|| {
            for _ in 0..10 {
                engine.reconcile(None).unwrap();
            }
        });
    });

    // No snapshot for U1, so nothing can have been cleared.
    assert_eq!(store.list_masks().unwrap().len(), codes.len());
    let health = engine.health();
    assert!(health.is_healthy());
    assert_eq!(health.registry_version, 1);
}
