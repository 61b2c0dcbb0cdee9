//! Numeric threshold rules: the warning side of the per-unit counts.

use serde_json::Value;
use tracing::warn;

use faultline_core::FieldBag;

use crate::extractor::{kind_of, MalformedField};
use crate::registry::{FaultRegistry, ThresholdRule};

/// One tripped rule and the first field that tripped it.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBreach {
    pub code: String,
    pub name: String,
    pub field: String,
    pub value: f64,
    pub limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdReport {
    /// At most one entry per rule.
    pub breaches: Vec<ThresholdBreach>,
    pub malformed: Vec<MalformedField>,
}

impl ThresholdReport {
    pub fn warning_count(&self) -> u64 {
        self.breaches.len() as u64
    }
}

/// Evaluate every threshold rule against `fields`.
///
/// Missing and `null` fields are "no breach". Numbers and numeric strings are
/// compared; anything else is reported as malformed and skipped.
pub fn evaluate(registry: &FaultRegistry, fields: &FieldBag) -> ThresholdReport {
    let mut report = ThresholdReport::default();
    for rule in &registry.thresholds {
        if let Some(breach) = evaluate_rule(rule, fields, &mut report.malformed) {
            report.breaches.push(breach);
        }
    }
    report
}

pub fn evaluate_logged(registry: &FaultRegistry, unit_key: &str, fields: &FieldBag) -> ThresholdReport {
    let report = evaluate(registry, fields);
    for m in &report.malformed {
        warn!(unit_key, field = %m.field, reason = %m.reason, "Skipping malformed threshold field");
    }
    report
}

fn evaluate_rule(
    rule: &ThresholdRule,
    fields: &FieldBag,
    malformed: &mut Vec<MalformedField>,
) -> Option<ThresholdBreach> {
    let mut breach = None;
    for field in &rule.fields {
        let value = match fields.get(field) {
            None | Some(Value::Null) => continue,
            Some(v) => match numeric(v) {
                Some(n) => n,
                None => {
                    malformed.push(MalformedField {
                        field: field.clone(),
                        reason: format!("expected number, found {}", kind_of(v)),
                    });
                    continue;
                }
            },
        };
        if breach.is_none() && rule.comparison.breached(value, rule.limit) {
            breach = Some(ThresholdBreach {
                code: rule.code.clone(),
                name: rule.name.clone(),
                field: field.clone(),
                value,
                limit: rule.limit,
            });
        }
    }
    breach
}

pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
