//! Telemetry snapshots: one sample of one physical unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::ClockPolicy;

/// Open-ended field bag. The schema is fixed only by naming convention.
pub type FieldBag = serde_json::Map<String, Value>;

/// One telemetry sample for a physical unit.
///
/// Snapshots are written by the ingestion pipeline and never mutated.
/// Only the newest one per `unit_key` (under the active clock) feeds live
/// aggregation; the rest are history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable device identifier, e.g. `HVAC-67-07002-01`.
    pub unit_key: String,
    /// Aggregation level above the unit (the train).
    pub group_key: String,
    /// Carriage ordinal within the group.
    pub sub_key: i64,
    /// Device-reported capture time.
    pub event_time: DateTime<Utc>,
    /// Time the pipeline received the sample.
    pub ingest_time: DateTime<Utc>,
    #[serde(default)]
    pub fields: FieldBag,
}

impl Snapshot {
    /// Build an empty snapshot whose two clocks agree.
    pub fn new(
        unit_key: impl Into<String>,
        group_key: impl Into<String>,
        sub_key: i64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            unit_key: unit_key.into(),
            group_key: group_key.into(),
            sub_key,
            event_time: at,
            ingest_time: at,
            fields: FieldBag::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_ingest_time(mut self, ingest_time: DateTime<Utc>) -> Self {
        self.ingest_time = ingest_time;
        self
    }

    /// Capture time under the active clock.
    pub fn captured_at(&self, clock: ClockPolicy) -> DateTime<Utc> {
        match clock {
            ClockPolicy::Device => self.event_time,
            ClockPolicy::Ingest => self.ingest_time,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Metadata and fields merged into one flat JSON object, the shape the
    /// dashboard detail view iterates over. Metadata wins on name clashes.
    pub fn flattened(&self) -> Value {
        let mut out = self.fields.clone();
        out.insert("unit_key".into(), Value::from(self.unit_key.clone()));
        out.insert("group_key".into(), Value::from(self.group_key.clone()));
        out.insert("sub_key".into(), Value::from(self.sub_key));
        out.insert("event_time".into(), Value::from(self.event_time.to_rfc3339()));
        out.insert("ingest_time".into(), Value::from(self.ingest_time.to_rfc3339()));
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_captured_at_uses_selected_clock() {
        let device = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        let ingest = Utc.with_ymd_and_hms(2024, 8, 2, 9, 5, 0).unwrap();
        let snap = Snapshot::new("U1", "7002", 1, device).with_ingest_time(ingest);
        assert_eq!(snap.captured_at(ClockPolicy::Device), device);
        assert_eq!(snap.captured_at(ClockPolicy::Ingest), ingest);
    }

    #[test]
    fn test_flattened_merges_fields_and_metadata() {
        let at = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        let snap = Snapshot::new("U1", "7002", 3, at)
            .with_field("Tveh1", 245)
            .with_field("unit_key", "spoofed");
        let flat = snap.flattened();
        assert_eq!(flat["Tveh1"], 245);
        assert_eq!(flat["unit_key"], "U1");
        assert_eq!(flat["sub_key"], 3);
    }
}
