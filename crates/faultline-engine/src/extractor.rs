//! Fault-bit extraction: which recognized fault fields are `true` right now.

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use faultline_core::FieldBag;

use crate::registry::FaultRegistry;

/// A field that matched a fault family but could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    pub field: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Fault fields currently `true`.
    pub active: BTreeSet<String>,
    /// Recognized fault fields that were skipped.
    pub malformed: Vec<MalformedField>,
    /// Active fields matched by a family prefix but absent from the fault table.
    pub unregistered: Vec<String>,
}

/// Collect the fault fields in `fields` whose value is boolean `true`.
///
/// Fields outside every family are ignored. `false` and `null` are not
/// active. Any other value on a recognized field is reported as malformed
/// and skipped; the rest of the bag is still evaluated.
pub fn extract(registry: &FaultRegistry, fields: &FieldBag) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for (name, value) in fields {
        if registry.match_family(name).is_none() {
            continue;
        }
        match value {
            Value::Bool(true) => {
                if registry.lookup(name).is_none() {
                    report.unregistered.push(name.clone());
                }
                report.active.insert(name.clone());
            }
            Value::Bool(false) | Value::Null => {}
            other => report.malformed.push(MalformedField {
                field: name.clone(),
                reason: format!("expected boolean, found {}", kind_of(other)),
            }),
        }
    }
    report
}

/// Extract, logging malformed fields against their unit.
pub fn extract_logged(registry: &FaultRegistry, unit_key: &str, fields: &FieldBag) -> ExtractionReport {
    let report = extract(registry, fields);
    for m in &report.malformed {
        warn!(unit_key, field = %m.field, reason = %m.reason, "Skipping malformed fault field");
    }
    report
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
