//! Latest-per-key projection over the append-only event log.
//!
//! The log is never deduplicated at write time. For "current state" views
//! each `(group_key, sub_key, fault_code)` is reduced to its newest event
//! under the deduplicator's clock.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use faultline_core::{ClockPolicy, FaultEvent};

/// Default partition key.
pub type EventKey = (String, i64, String);

/// Output ordering. Both serve real call sites.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrder {
    /// `(group_key, sub_key, fault_code)` ascending: grouped summary.
    #[default]
    ByKey,
    /// Newest first: timeline.
    Chronological,
}

/// Deduplicator bound to one clock at construction.
#[derive(Debug, Clone, Copy)]
pub struct EventDeduplicator {
    clock: ClockPolicy,
}

impl EventDeduplicator {
    pub fn new(clock: ClockPolicy) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> ClockPolicy {
        self.clock
    }

    /// Standard key: `(group_key, sub_key, fault_code)`.
    pub fn key_of(event: &FaultEvent) -> EventKey {
        (event.group_key.clone(), event.sub_key, event.fault_code.clone())
    }

    /// Latest event per standard key.
    pub fn latest_per_key(&self, events: Vec<FaultEvent>, order: EventOrder) -> Vec<FaultEvent> {
        self.latest_per_key_by(events, Self::key_of, order)
    }

    /// Latest event per `key_fn(event)`.
    ///
    /// Ties on timestamp keep the first event seen, so the result is stable
    /// for a given input order. `Chronological` output breaks timestamp ties
    /// by key.
    pub fn latest_per_key_by<K, F>(&self, events: Vec<FaultEvent>, key_fn: F, order: EventOrder) -> Vec<FaultEvent>
    where
        K: Eq + Hash + Ord,
        F: Fn(&FaultEvent) -> K,
    {
        let mut latest: HashMap<K, FaultEvent> = HashMap::new();
        for event in events {
            let key = key_fn(&event);
            let newer = latest
                .get(&key)
                .map_or(true, |kept| event.occurred_at(self.clock) > kept.occurred_at(self.clock));
            if newer {
                latest.insert(key, event);
            }
        }

        let mut out: Vec<(K, FaultEvent)> = latest.into_iter().collect();
        match order {
            EventOrder::ByKey => out.sort_by(|a, b| a.0.cmp(&b.0)),
            EventOrder::Chronological => out.sort_by(|a, b| {
                b.1.occurred_at(self.clock)
                    .cmp(&a.1.occurred_at(self.clock))
                    .then_with(|| a.0.cmp(&b.0))
            }),
        }
        out.into_iter().map(|(_, e)| e).collect()
    }
}
