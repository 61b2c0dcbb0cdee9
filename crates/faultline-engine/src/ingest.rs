//! Ingestion: parsed-signal messages into snapshots and alarm events.
//!
//! Each new snapshot also appends one `alarm` event per true fault field and
//! one `life` event per component past a service-life tier, stamped with the
//! snapshot's clocks. Threshold rules only feed the live warning counts and
//! are not logged. A replayed message writes nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use faultline_core::traits::ITelemetryWriter;
use faultline_core::types::event::{EVENT_TYPE_ALARM, EVENT_TYPE_LIFE};
use faultline_core::types::message::ParsedSignal;
use faultline_core::{FaultEvent, Snapshot};

use crate::errors::{FaultError, FaultResult};
use crate::extractor;
use crate::life;
use crate::registry::FaultRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub snapshot_inserted: bool,
    pub events_appended: usize,
}

pub struct Ingestor {
    writer: Arc<dyn ITelemetryWriter>,
    registry: Arc<FaultRegistry>,
}

impl Ingestor {
    pub fn new(writer: Arc<dyn ITelemetryWriter>, registry: Arc<FaultRegistry>) -> Self {
        Self { writer, registry }
    }

    /// Decode and store one raw message.
    pub fn ingest_message(&self, bytes: &[u8], received_at: DateTime<Utc>) -> FaultResult<IngestReport> {
        let snapshot = ParsedSignal::from_json(bytes)?.into_snapshot(received_at)?;
        self.ingest_snapshot(&snapshot)
    }

    /// Store one snapshot. A snapshot without a unit or group key could never
    /// be aggregated or reconciled and is rejected before any write.
    pub fn ingest_snapshot(&self, snapshot: &Snapshot) -> FaultResult<IngestReport> {
        for (field, value) in [("unit_key", &snapshot.unit_key), ("group_key", &snapshot.group_key)] {
            if value.trim().is_empty() {
                return Err(FaultError::MalformedSnapshot {
                    unit_key: snapshot.unit_key.clone(),
                    field: field.to_string(),
                    reason: "identifier is empty".into(),
                });
            }
        }

        let inserted = self
            .writer
            .insert_snapshot(snapshot)
            .map_err(FaultError::storage("insert_snapshot"))?;
        if !inserted {
            debug!(unit_key = %snapshot.unit_key, "Replayed snapshot ignored");
            return Ok(IngestReport::default());
        }

        let events = self.derive_events(snapshot);
        let appended = if events.is_empty() {
            0
        } else {
            self.writer
                .append_events(&events)
                .map_err(FaultError::storage("append_events"))?
        };
        Ok(IngestReport {
            snapshot_inserted: true,
            events_appended: appended,
        })
    }

    /// The events a snapshot implies. Registered faults are logged under
    /// their event code; unregistered prefix matches under the field name.
    pub fn derive_events(&self, snapshot: &Snapshot) -> Vec<FaultEvent> {
        let extraction = extractor::extract(&self.registry, &snapshot.fields);
        let life = life::evaluate_logged(&self.registry, &snapshot.unit_key, snapshot.sub_key, &snapshot.fields);

        let alarms = extraction.active.iter().map(|field| {
            let (code, name, level) = match self.registry.lookup(field) {
                Some(def) => (def.code.clone(), def.name.clone(), def.level),
                None => (field.clone(), field.clone(), 2),
            };
            self.event(snapshot, code, name, level, EVENT_TYPE_ALARM)
        });
        let wear = life.hits.into_iter().map(|hit| {
            let severity = hit.tier.severity();
            self.event(snapshot, hit.code, hit.name, severity, EVENT_TYPE_LIFE)
        });
        alarms.chain(wear).collect()
    }

    fn event(&self, snapshot: &Snapshot, code: String, name: String, severity: i64, event_type: &str) -> FaultEvent {
        FaultEvent {
            unit_key: snapshot.unit_key.clone(),
            group_key: snapshot.group_key.clone(),
            sub_key: snapshot.sub_key,
            fault_code: code,
            fault_name: name,
            severity,
            event_type: event_type.to_string(),
            event_time: snapshot.event_time,
            ingest_time: snapshot.ingest_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::ClockPolicy;
    use faultline_storage::SqliteFaultStore;

    fn ingestor() -> (Ingestor, Arc<SqliteFaultStore>) {
        let store = Arc::new(SqliteFaultStore::open_in_memory(ClockPolicy::Device).unwrap());
        let ingestor = Ingestor::new(store.clone(), Arc::new(FaultRegistry::with_defaults()));
        (ingestor, store)
    }

    #[test]
    fn test_message_becomes_snapshot_and_events() {
        let (ingestor, store) = ingestor();
        let msg = br#"{
            "line_id": 67, "train_id": "7002", "carriage_id": 1,
            "device_id": "HVAC-67-7002-1",
            "event_time_text": "2024-08-02 09:00:00",
            "ingest_time": "2024-08-02T09:00:02Z",
            "raw": {"BfltFadU11": true, "Bflt_TestFault": true, "PresdiffU2": 3500,
                    "DwcpOpTmU11": 140000000, "Tveh1": 24}
        }"#;
        let report = ingestor.ingest_message(msg, Utc::now()).unwrap();
        assert!(report.snapshot_inserted);
        assert_eq!(report.events_appended, 3);
        assert_eq!(store.snapshot_count().unwrap(), 1);
        assert_eq!(store.event_count().unwrap(), 3);
    }

    #[test]
    fn test_replay_writes_nothing() {
        let (ingestor, store) = ingestor();
        let msg = br#"{"train_id": "7002", "device_id": "U1",
            "event_time_text": "2024-08-02 09:00:00", "ingest_time": "2024-08-02 09:00:01",
            "raw": {"BfltFadU11": true}}"#;
        ingestor.ingest_message(msg, Utc::now()).unwrap();
        let again = ingestor.ingest_message(msg, Utc::now()).unwrap();
        assert_eq!(again, IngestReport::default());
        assert_eq!(store.event_count().unwrap(), 1);
    }

    #[test]
    fn test_registered_fault_uses_event_code() {
        let (ingestor, _) = ingestor();
        let snap = Snapshot::new("U1", "7002", 1, Utc::now()).with_field("BfltFadU11", true);
        let events = ingestor.derive_events(&snap);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fault_code, "bflt_fad_u11");
        assert_eq!(events[0].fault_name, "Fresh-air damper fault U1-1");
        assert_eq!(events[0].event_type, EVENT_TYPE_ALARM);
    }

    #[test]
    fn test_bad_message_rejected() {
        let (ingestor, _) = ingestor();
        let err = ingestor.ingest_message(br#"{"device_id": "U1", "raw": {}}"#, Utc::now()).unwrap_err();
        assert!(matches!(err, FaultError::Message(_)));
    }

    #[test]
    fn test_life_events_carry_tier_severity() {
        let (ingestor, _) = ingestor();
        let snap = Snapshot::new("U1", "7002", 2, Utc::now())
            .with_field("DwcpOpTmU11", 170_000_000_i64)
            .with_field("DwfadOpCntU1", 950_000)
            .with_field("DwefOpTmU11", 70_000_000)
            .with_field("PresdiffU1", 3500);
        let events = ingestor.derive_events(&snap);
        let life: Vec<_> = events
            .iter()
            .map(|e| (e.event_type.as_str(), e.fault_code.as_str(), e.severity))
            .collect();
        assert_eq!(
            life,
            vec![("life", "52001", 2), ("life", "52003", 3), ("life", "52005", 3)]
        );
    }

    #[test]
    fn test_snapshot_without_group_rejected() {
        let (ingestor, store) = ingestor();
        let snap = Snapshot::new("U1", " ", 1, Utc::now()).with_field("BfltFadU11", true);
        let err = ingestor.ingest_snapshot(&snap).unwrap_err();
        assert!(matches!(err, FaultError::MalformedSnapshot { ref field, .. } if field == "group_key"));
        assert_eq!(store.snapshot_count().unwrap(), 0);
    }
}
