//! Component service-life tiers.
//!
//! Cumulative runtime and switching-cycle counters are checked against their
//! rule's `warn` and `crit` tiers. Each tripped rule yields one hit, at the
//! highest tier reached.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use faultline_core::FieldBag;

use crate::extractor::{kind_of, MalformedField};
use crate::registry::{FaultRegistry, LifeRule};
use crate::thresholds::numeric;

/// Per-carriage code block for life events.
const LIFE_CODE_BASE: i64 = 50_000;
const CODES_PER_CARRIAGE: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifeTier {
    Warn,
    Crit,
}

impl LifeTier {
    /// Event-log severity.
    pub fn severity(self) -> i64 {
        match self {
            Self::Warn => 2,
            Self::Crit => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifeHit {
    pub code: String,
    pub name: String,
    pub field: String,
    pub tier: LifeTier,
    pub value: f64,
    pub rated_limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifeReport {
    pub hits: Vec<LifeHit>,
    pub malformed: Vec<MalformedField>,
}

/// Event code for a life rule on carriage `sub_key`.
pub fn life_code(sub_key: i64, offset: i64) -> String {
    (sub_key * CODES_PER_CARRIAGE + LIFE_CODE_BASE + offset).to_string()
}

/// The tier `value` reaches under `rule`, if any.
pub fn tier_for(rule: &LifeRule, value: f64) -> Option<LifeTier> {
    if value >= rule.crit {
        Some(LifeTier::Crit)
    } else if value >= rule.warn {
        Some(LifeTier::Warn)
    } else {
        None
    }
}

/// Evaluate every life rule against `fields` for carriage `sub_key`.
/// Missing and `null` counters are below every tier.
pub fn evaluate(registry: &FaultRegistry, sub_key: i64, fields: &FieldBag) -> LifeReport {
    let mut report = LifeReport::default();
    for rule in &registry.life {
        let value = match fields.get(&rule.field) {
            None | Some(Value::Null) => continue,
            Some(v) => match numeric(v) {
                Some(n) => n,
                None => {
                    report.malformed.push(MalformedField {
                        field: rule.field.clone(),
                        reason: format!("expected counter, found {}", kind_of(v)),
                    });
                    continue;
                }
            },
        };
        if let Some(tier) = tier_for(rule, value) {
            report.hits.push(LifeHit {
                code: life_code(sub_key, rule.offset),
                name: rule.name.clone(),
                field: rule.field.clone(),
                tier,
                value,
                rated_limit: rule.rated_limit,
            });
        }
    }
    report
}

pub fn evaluate_logged(registry: &FaultRegistry, unit_key: &str, sub_key: i64, fields: &FieldBag) -> LifeReport {
    let report = evaluate(registry, sub_key, fields);
    for m in &report.malformed {
        warn!(unit_key, field = %m.field, reason = %m.reason, "Skipping malformed life counter");
    }
    report
}
