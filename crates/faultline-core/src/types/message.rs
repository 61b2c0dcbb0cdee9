//! Decoding of parsed-signal messages into snapshots.
//!
//! The parser stage publishes one JSON object per device frame with the
//! identifiers at the top level and the decoded signal values under `raw`.
//! Identifiers arrive as strings from some producers and as integers from
//! others, so both are accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::snapshot::{FieldBag, Snapshot};
use super::timestamp::{parse_time_or, parse_time_text};

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Malformed message JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message carries no device_id")]
    MissingDeviceId,

    #[error("Message for {device_id} has an empty raw payload")]
    EmptyPayload { device_id: String },
}

/// A parsed-signal message as produced upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedSignal {
    #[serde(default, deserialize_with = "id_string")]
    pub line_id: String,
    #[serde(default, deserialize_with = "id_string")]
    pub train_id: String,
    #[serde(default)]
    pub carriage_id: i64,
    #[serde(default, deserialize_with = "id_string")]
    pub device_id: String,
    #[serde(default)]
    pub event_time_text: String,
    #[serde(default)]
    pub ingest_time: String,
    #[serde(default)]
    pub raw: FieldBag,
}

impl ParsedSignal {
    pub fn from_json(bytes: &[u8]) -> Result<Self, MessageError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Convert into a snapshot.
    ///
    /// A missing or unparseable ingest time falls back to `received_at`; a
    /// missing or unparseable device time falls back to the ingest time.
    /// Messages with an empty `raw` are not telemetry and are rejected.
    pub fn into_snapshot(self, received_at: DateTime<Utc>) -> Result<Snapshot, MessageError> {
        if self.device_id.trim().is_empty() {
            return Err(MessageError::MissingDeviceId);
        }
        if self.raw.is_empty() {
            return Err(MessageError::EmptyPayload {
                device_id: self.device_id,
            });
        }
        let ingest_time = parse_time_or(&self.ingest_time, received_at);
        let event_time = parse_time_text(&self.event_time_text).unwrap_or(ingest_time);
        Ok(Snapshot {
            unit_key: self.device_id,
            group_key: self.train_id,
            sub_key: self.carriage_id,
            event_time,
            ingest_time,
            fields: self.raw,
        })
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or integer identifier, got {other}"
        ))),
    }
}
