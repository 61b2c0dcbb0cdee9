//! Per-unit assessment and per-group alarm/warning counts.
//!
//! Pure functions over already-loaded snapshots and masks; the service
//! decides when to reconcile and what to load.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use faultline_core::{ClockPolicy, MaskRecord, Snapshot};

use crate::extractor::{self, MalformedField};
use crate::registry::FaultRegistry;
use crate::thresholds::{self, ThresholdBreach};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupCounts {
    pub alarm_count: u64,
    pub warning_count: u64,
    pub total: u64,
}

impl GroupCounts {
    fn add(&mut self, alarms: u64, warnings: u64) {
        self.alarm_count += alarms;
        self.warning_count += warnings;
        self.total = self.alarm_count + self.warning_count;
    }
}

/// Counts keyed by group, in group order.
pub type GroupSummary = BTreeMap<String, GroupCounts>;

/// Everything the engine knows about one unit's latest snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitAssessment {
    pub unit_key: String,
    pub group_key: String,
    pub sub_key: i64,
    pub captured_at: DateTime<Utc>,
    /// True fault fields that are not masked.
    pub active: BTreeSet<String>,
    /// True fault fields hidden by a mask.
    pub suppressed: BTreeSet<String>,
    pub breaches: Vec<ThresholdBreach>,
    pub malformed: Vec<MalformedField>,
    pub unregistered: Vec<String>,
}

impl UnitAssessment {
    pub fn alarm_count(&self) -> u64 {
        self.active.len() as u64
    }

    pub fn warning_count(&self) -> u64 {
        self.breaches.len() as u64
    }
}

/// Assess one snapshot against the masks held for its unit.
pub fn assess_unit(
    registry: &FaultRegistry,
    snapshot: &Snapshot,
    masked: &HashSet<&str>,
    clock: ClockPolicy,
) -> UnitAssessment {
    let extraction = extractor::extract_logged(registry, &snapshot.unit_key, &snapshot.fields);
    let warnings = thresholds::evaluate_logged(registry, &snapshot.unit_key, &snapshot.fields);

    let (suppressed, active): (BTreeSet<String>, BTreeSet<String>) = extraction
        .active
        .into_iter()
        .partition(|code| masked.contains(code.as_str()));

    let mut malformed = extraction.malformed;
    malformed.extend(warnings.malformed);

    UnitAssessment {
        unit_key: snapshot.unit_key.clone(),
        group_key: snapshot.group_key.clone(),
        sub_key: snapshot.sub_key,
        captured_at: snapshot.captured_at(clock),
        active,
        suppressed,
        breaches: warnings.breaches,
        malformed,
        unregistered: extraction.unregistered,
    }
}

/// Index masks by unit for set-difference lookups.
pub fn masks_by_unit(masks: &[MaskRecord]) -> HashMap<&str, HashSet<&str>> {
    let mut out: HashMap<&str, HashSet<&str>> = HashMap::new();
    for m in masks {
        out.entry(m.unit_key.as_str()).or_default().insert(m.fault_code.as_str());
    }
    out
}

/// Assess every snapshot (one per unit expected) against the mask set.
pub fn assess_all(
    registry: &FaultRegistry,
    snapshots: &[Snapshot],
    masks: &[MaskRecord],
    clock: ClockPolicy,
) -> Vec<UnitAssessment> {
    let index = masks_by_unit(masks);
    let empty = HashSet::new();
    snapshots
        .iter()
        .map(|s| {
            let masked = index.get(s.unit_key.as_str()).unwrap_or(&empty);
            assess_unit(registry, s, masked, clock)
        })
        .collect()
}

/// Sum unit counts per group. Every unit's group appears, even at zero.
pub fn aggregate_by_group(assessments: &[UnitAssessment]) -> GroupSummary {
    let mut summary = GroupSummary::new();
    for a in assessments {
        summary
            .entry(a.group_key.clone())
            .or_default()
            .add(a.alarm_count(), a.warning_count());
    }
    summary
}
