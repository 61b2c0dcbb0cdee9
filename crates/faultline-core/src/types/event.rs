//! Discrete, already-classified fault events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::ClockPolicy;

/// Event type for raw fault-bit alarms.
pub const EVENT_TYPE_ALARM: &str = "alarm";
/// Event type for rule-based early warnings.
pub const EVENT_TYPE_PREDICT: &str = "predict";
/// Event type for component service-life warnings.
pub const EVENT_TYPE_LIFE: &str = "life";

/// One row of the append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultEvent {
    pub unit_key: String,
    pub group_key: String,
    pub sub_key: i64,
    pub fault_code: String,
    pub fault_name: String,
    pub severity: i64,
    pub event_type: String,
    pub event_time: DateTime<Utc>,
    pub ingest_time: DateTime<Utc>,
}

impl FaultEvent {
    /// Timestamp under the active clock.
    pub fn occurred_at(&self, clock: ClockPolicy) -> DateTime<Utc> {
        match clock {
            ClockPolicy::Device => self.event_time,
            ClockPolicy::Ingest => self.ingest_time,
        }
    }
}

/// Optional narrowing for event range queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub group_key: Option<String>,
    pub event_type: Option<String>,
}

impl EventFilter {
    pub fn event_type(event_type: impl Into<String>) -> Self {
        Self {
            group_key: None,
            event_type: Some(event_type.into()),
        }
    }

    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }
}

/// Inclusive time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_occurred_at_follows_clock() {
        let device = Utc.with_ymd_and_hms(2024, 8, 2, 10, 0, 0).unwrap();
        let ingest = Utc.with_ymd_and_hms(2024, 8, 2, 10, 0, 7).unwrap();
        let event = FaultEvent {
            unit_key: "HVAC-67-07002-01".into(),
            group_key: "7002".into(),
            sub_key: 1,
            fault_code: "bflt_fad_u11".into(),
            fault_name: "fresh-air damper fault U1-1".into(),
            severity: 2,
            event_type: EVENT_TYPE_ALARM.into(),
            event_time: device,
            ingest_time: ingest,
        };
        assert_eq!(event.occurred_at(ClockPolicy::Device), device);
        assert_eq!(event.occurred_at(ClockPolicy::Ingest), ingest);
    }

    #[test]
    fn test_range_is_inclusive() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let range = TimeRange::new(a, b);
        assert!(range.contains(a));
        assert!(range.contains(b));
        assert!(!TimeRange::new(b, a).is_valid());
    }
}
