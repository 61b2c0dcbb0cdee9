//! Property-based tests for suppression and deduplication guarantees.
//!
//! 1. Masking one active fault lowers its group's alarm count by exactly one
//!    and leaves every other group untouched.
//! 2. Masking the same pair twice is indistinguishable from masking it once.
//! 3. Deduplication yields one event per key, carrying that key's newest time.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use faultline_core::traits::ITelemetryWriter;
use faultline_core::types::event::EVENT_TYPE_ALARM;
use faultline_core::{ClockPolicy, FaultEvent, FaultlineConfig, Snapshot};
use faultline_engine::{EventDeduplicator, EventOrder, FaultEngine, FaultRegistry};
use faultline_storage::SqliteFaultStore;

// =============================================================================
// Strategy helpers
// =============================================================================

const GROUPS: [&str; 3] = ["7001", "7002", "7003"];
const FAULTS: [&str; 4] = ["BfltFadU11", "BfltRadU11", "BlpfltCompU11", "Bflt_Spare"];

/// Per unit: group index and which of `FAULTS` are active.
fn fleet_strategy() -> impl Strategy<Value = Vec<(usize, [bool; 4])>> {
    prop::collection::vec((0..GROUPS.len(), prop::array::uniform4(any::<bool>())), 1..8)
}

fn build_engine(fleet: &[(usize, [bool; 4])]) -> FaultEngine {
    let config = FaultlineConfig::default();
    let store = Arc::new(SqliteFaultStore::open_in_memory(config.clock).unwrap());
    let captured = Utc::now() - Duration::minutes(5);
    for (i, (group, active)) in fleet.iter().enumerate() {
        let mut snap = Snapshot::new(format!("U{i}"), GROUPS[*group], i as i64, captured);
        for (field, on) in FAULTS.iter().zip(active) {
            snap = snap.with_field(*field, *on);
        }
        store.insert_snapshot(&snap).unwrap();
    }
    FaultEngine::new(store, Arc::new(FaultRegistry::with_defaults()), &config)
}

fn event_strategy() -> impl Strategy<Value = FaultEvent> {
    (0..2usize, 1..4i64, 0..3usize, 0..10_000i64).prop_map(|(g, sub, code, offset)| {
        let t = Utc.with_ymd_and_hms(2024, 8, 2, 0, 0, 0).unwrap() + Duration::seconds(offset);
        FaultEvent {
            unit_key: format!("U{sub}"),
            group_key: GROUPS[g].to_string(),
            sub_key: sub,
            fault_code: FAULTS[code].to_string(),
            fault_name: FAULTS[code].to_string(),
            severity: 2,
            event_type: EVENT_TYPE_ALARM.to_string(),
            event_time: t,
            ingest_time: t,
        }
    })
}

// =============================================================================
// Suppression
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn mask_lowers_exactly_one_alarm(fleet in fleet_strategy(), pick in any::<prop::sample::Index>()) {
        let active: Vec<(usize, usize)> = fleet
            .iter()
            .enumerate()
            .flat_map(|(u, (_, on))| on.iter().enumerate().filter(|(_, b)| **b).map(move |(f, _)| (u, f)))
            .collect();
        prop_assume!(!active.is_empty());
        let (unit, field) = active[pick.index(active.len())];

        let engine = build_engine(&fleet);
        let before = engine.get_group_summary(None).unwrap();
        engine.mask_fault(&format!("U{unit}"), FAULTS[field]).unwrap();
        let after = engine.get_group_summary(None).unwrap();

        let target = GROUPS[fleet[unit].0];
        prop_assert_eq!(after[target].alarm_count, before[target].alarm_count - 1);
        for group in before.keys().filter(|g| g.as_str() != target) {
            prop_assert_eq!(&after[group], &before[group]);
        }
    }

    #[test]
    fn double_mask_equals_single_mask(fleet in fleet_strategy(), unit in 0..8usize, field in 0..FAULTS.len()) {
        let unit_key = format!("U{}", unit % fleet.len());
        let engine = build_engine(&fleet);

        engine.mask_fault(&unit_key, FAULTS[field]).unwrap();
        let once = engine.get_group_summary(None).unwrap();
        let second = engine.mask_fault(&unit_key, FAULTS[field]).unwrap();
        let twice = engine.get_group_summary(None).unwrap();

        prop_assert!(!second.created);
        prop_assert_eq!(once, twice);
    }
}

// =============================================================================
// Deduplication
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn dedup_keeps_newest_per_key(events in prop::collection::vec(event_strategy(), 0..40)) {
        let mut newest: HashMap<_, _> = HashMap::new();
        for e in &events {
            let entry = newest.entry(EventDeduplicator::key_of(e)).or_insert(e.event_time);
            if e.event_time > *entry {
                *entry = e.event_time;
            }
        }

        let dedup = EventDeduplicator::new(ClockPolicy::Device);
        let out = dedup.latest_per_key(events, EventOrder::ByKey);

        prop_assert_eq!(out.len(), newest.len());
        for e in &out {
            prop_assert_eq!(Some(&e.event_time), newest.get(&EventDeduplicator::key_of(e)));
        }
        let keys: Vec<_> = out.iter().map(EventDeduplicator::key_of).collect();
        prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn chronological_order_is_newest_first(events in prop::collection::vec(event_strategy(), 0..40)) {
        let dedup = EventDeduplicator::new(ClockPolicy::Device);
        let out = dedup.latest_per_key(events, EventOrder::Chronological);
        prop_assert!(out.windows(2).all(|w| w[0].event_time >= w[1].event_time));
    }
}
