//! FaultEngine: the transport-facing facade.
//!
//! Every aggregate read runs the reconciler first (subject to the interval
//! guard) and fails as a whole if reconciliation fails. Masking is an
//! independent write.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use faultline_core::traits::{IFaultStorage, StorageHealth};
use faultline_core::{ClockPolicy, EventFilter, FaultEvent, FaultlineConfig, MaskRecord, TimeRange};
use faultline_storage::SqliteFaultStore;

use crate::aggregator::{self, GroupSummary};
use crate::errors::{FaultError, FaultResult};
use crate::events::{EventDeduplicator, EventOrder};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::registry::FaultRegistry;

/// One active, unmasked fault on a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmHit {
    pub unit_key: String,
    pub group_key: String,
    pub sub_key: i64,
    /// Telemetry field name; the code an operator masks.
    pub fault_code: String,
    /// Event-log code from the registry, when the fault is registered.
    pub event_code: Option<String>,
    pub fault_name: String,
    pub level: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskAck {
    pub unit_key: String,
    pub fault_code: String,
    /// `false` when the pair was already masked.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub event_type: String,
    pub group_key: Option<String>,
    pub range: TimeRange,
    pub order: EventOrder,
}

impl EventQuery {
    pub fn new(event_type: impl Into<String>, range: TimeRange) -> Self {
        Self {
            event_type: event_type.into(),
            group_key: None,
            range,
            order: EventOrder::default(),
        }
    }

    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    pub fn ordered(mut self, order: EventOrder) -> Self {
        self.order = order;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineHealth {
    pub storage: StorageHealth,
    pub clock: ClockPolicy,
    pub registry_version: u32,
    pub last_reconcile: Option<Instant>,
}

impl EngineHealth {
    pub fn is_healthy(&self) -> bool {
        self.storage.connected
    }
}

pub struct FaultEngine {
    storage: Arc<dyn IFaultStorage>,
    registry: Arc<FaultRegistry>,
    reconciler: Reconciler,
    dedup: EventDeduplicator,
    max_event_rows: usize,
    detail_limit: usize,
}

impl FaultEngine {
    /// Wire an engine over an existing store. The deduplicator takes the
    /// store's clock so ordering and range filtering always agree.
    pub fn new(storage: Arc<dyn IFaultStorage>, registry: Arc<FaultRegistry>, config: &FaultlineConfig) -> Self {
        if storage.clock() != config.clock {
            warn!(
                store = %storage.clock(),
                configured = %config.clock,
                "Store clock differs from configured clock, using the store's"
            );
        }
        let dedup = EventDeduplicator::new(storage.clock());
        let reconciler = Reconciler::new(Arc::clone(&storage), &config.reconcile);
        Self {
            storage,
            registry,
            reconciler,
            dedup,
            max_event_rows: config.events.max_rows,
            detail_limit: config.events.detail_limit,
        }
    }

    /// Open the store and registry named in `config`.
    pub fn open(config: &FaultlineConfig) -> FaultResult<Self> {
        config.validate()?;
        let store = open_store(config)?;
        let registry = load_registry(config)?;
        info!(
            clock = %config.clock,
            registry_version = registry.version,
            faults = registry.faults.len(),
            "Fault engine ready"
        );
        Ok(Self::new(store, Arc::new(registry), config))
    }

    pub fn registry(&self) -> &Arc<FaultRegistry> {
        &self.registry
    }

    pub fn clock(&self) -> ClockPolicy {
        self.dedup.clock()
    }

    /// Alarm/warning counts per group, after reconciliation.
    pub fn get_group_summary(&self, deadline: Option<Instant>) -> FaultResult<GroupSummary> {
        self.reconciler.reconcile_if_due(deadline)?;

        let snapshots = self
            .storage
            .latest_snapshot_per_unit(None)
            .map_err(FaultError::storage("latest_snapshot_per_unit"))?;
        let masks = self
            .storage
            .list_masks()
            .map_err(FaultError::storage("list_masks"))?;

        let assessments = aggregator::assess_all(&self.registry, &snapshots, &masks, self.clock());
        let summary = aggregator::aggregate_by_group(&assessments);
        debug!(units = snapshots.len(), groups = summary.len(), masks = masks.len(), "Group summary computed");
        Ok(summary)
    }

    /// Active, unmasked faults for the given units, after reconciliation.
    /// Unknown units contribute nothing.
    pub fn get_unit_alarms(&self, unit_keys: &[String], deadline: Option<Instant>) -> FaultResult<Vec<AlarmHit>> {
        self.reconciler.reconcile_if_due(deadline)?;

        let units: BTreeSet<&str> = unit_keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect();

        let mut hits = Vec::new();
        for unit_key in units {
            let Some(snapshot) = self
                .storage
                .latest_snapshot_for_unit(unit_key)
                .map_err(FaultError::storage("latest_snapshot_for_unit"))?
            else {
                continue;
            };
            let masks = self
                .storage
                .masks_for_unit(unit_key)
                .map_err(FaultError::storage("masks_for_unit"))?;
            let masked: HashSet<&str> = masks.iter().map(|m| m.fault_code.as_str()).collect();

            let assessment = aggregator::assess_unit(&self.registry, &snapshot, &masked, self.clock());
            for field in &assessment.active {
                let def = self.registry.lookup(field);
                hits.push(AlarmHit {
                    unit_key: assessment.unit_key.clone(),
                    group_key: assessment.group_key.clone(),
                    sub_key: assessment.sub_key,
                    fault_code: field.clone(),
                    event_code: def.map(|d| d.code.clone()),
                    fault_name: def.map_or_else(|| field.clone(), |d| d.name.clone()),
                    level: def.map_or(2, |d| d.level),
                    occurred_at: assessment.captured_at,
                });
            }
        }
        Ok(hits)
    }

    /// Suppress `fault_code` on `unit_key` until it is observed to clear.
    /// Masking an already-masked pair is a no-op.
    pub fn mask_fault(&self, unit_key: &str, fault_code: &str) -> FaultResult<MaskAck> {
        let unit_key = unit_key.trim();
        let fault_code = fault_code.trim();
        if unit_key.is_empty() {
            return Err(FaultError::InvalidMaskRequest("unit_key is empty".into()));
        }
        if fault_code.is_empty() {
            return Err(FaultError::InvalidMaskRequest("fault_code is empty".into()));
        }
        if self.registry.match_family(fault_code).is_none() {
            warn!(unit_key, fault_code, "Masking a field outside every fault family");
        }

        let record = MaskRecord {
            unit_key: unit_key.to_string(),
            fault_code: fault_code.to_string(),
            masked_at: Utc::now(),
        };
        let created = self
            .storage
            .insert_mask(&record)
            .map_err(FaultError::storage("insert_mask"))?;
        info!(unit_key, fault_code, created, "Fault masked");
        Ok(MaskAck {
            unit_key: record.unit_key,
            fault_code: record.fault_code,
            created,
        })
    }

    /// Latest event per `(group_key, sub_key, fault_code)` inside a range.
    pub fn get_deduplicated_events(&self, query: &EventQuery) -> FaultResult<Vec<FaultEvent>> {
        if !query.range.is_valid() {
            return Err(FaultError::InvalidTimeRange {
                start: query.range.start.to_rfc3339(),
                end: query.range.end.to_rfc3339(),
            });
        }
        let mut filter = EventFilter::default();
        if !query.event_type.trim().is_empty() {
            filter.event_type = Some(query.event_type.trim().to_string());
        }
        filter.group_key = query.group_key.clone();

        let raw = self
            .storage
            .raw_events_in_range(&query.range, &filter, self.max_event_rows)
            .map_err(FaultError::storage("raw_events_in_range"))?;
        if raw.len() >= self.max_event_rows {
            warn!(
                max_rows = self.max_event_rows,
                event_type = %query.event_type,
                "Event range hit the row cap, older events were not considered"
            );
        }
        Ok(self.dedup.latest_per_key(raw, query.order))
    }

    /// Most recent snapshots of a group, flattened for detail views.
    pub fn get_group_details(&self, group_key: &str, limit: Option<usize>) -> FaultResult<Vec<Value>> {
        let limit = limit.unwrap_or(self.detail_limit);
        let snapshots = self
            .storage
            .recent_snapshots_for_group(group_key, limit)
            .map_err(FaultError::storage("recent_snapshots_for_group"))?;
        Ok(snapshots.iter().map(|s| s.flattened()).collect())
    }

    /// Run one reconcile sweep now, ignoring the interval guard.
    pub fn reconcile(&self, deadline: Option<Instant>) -> FaultResult<ReconcileOutcome> {
        self.reconciler.reconcile(deadline)
    }

    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            storage: self.storage.health(),
            clock: self.clock(),
            registry_version: self.registry.version,
            last_reconcile: self.reconciler.guard().last_success(),
        }
    }
}

/// Open the SQLite store described by `config`. No path means in-memory.
pub fn open_store(config: &FaultlineConfig) -> FaultResult<Arc<SqliteFaultStore>> {
    let store = match config.storage.database_path.as_deref() {
        Some(path) => SqliteFaultStore::open(Path::new(path), config.clock, config.storage.read_pool_size),
        None => SqliteFaultStore::open_in_memory(config.clock),
    }
    .map_err(FaultError::storage("open"))?;
    Ok(Arc::new(store))
}

/// The registry file named in `config`, or the built-in defaults.
pub fn load_registry(config: &FaultlineConfig) -> FaultResult<FaultRegistry> {
    match config.registry_path.as_deref() {
        Some(path) => Ok(FaultRegistry::from_path(Path::new(path))?),
        None => Ok(FaultRegistry::with_defaults()),
    }
}
