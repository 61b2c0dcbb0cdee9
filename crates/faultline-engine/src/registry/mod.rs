//! TOML-driven fault registry.
//!
//! Turns naming-convention matching over an open-ended field bag into an
//! explicit, versioned table: fault families (field prefixes), the named
//! fault table, and numeric threshold rules. Extensible without code changes
//! through a registry TOML file layered over the built-in defaults.

mod defaults;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to read registry file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse registry: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid registry entry {entry}: {reason}")]
    Invalid { entry: String, reason: String },
}

/// A fault family: every boolean field whose name starts with `prefix`
/// (ASCII case-insensitive) is a fault bit of this family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultFamily {
    pub name: String,
    pub prefix: String,
}

impl FaultFamily {
    pub fn matches(&self, field: &str) -> bool {
        field
            .get(..self.prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(&self.prefix))
    }
}

/// A named entry in the fault table, keyed by its telemetry field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultDefinition {
    /// Telemetry field name. This is also the code operators mask.
    pub field: String,
    /// Event-log code for this fault.
    pub code: String,
    pub family: String,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: i64,
}

fn default_level() -> i64 {
    2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// value > limit
    Gt,
    /// value >= limit
    Ge,
}

impl Comparison {
    pub fn breached(self, value: f64, limit: f64) -> bool {
        match self {
            Self::Gt => value > limit,
            Self::Ge => value >= limit,
        }
    }
}

/// A warning condition over one or more equivalent numeric fields.
/// The rule counts once no matter how many of its fields trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub code: String,
    pub name: String,
    pub fields: Vec<String>,
    pub comparison: Comparison,
    pub limit: f64,
}

/// Service-life rule for one counter field (runtime seconds or switching
/// cycles). `warn` and `crit` are inclusive tiers below `rated_limit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeRule {
    pub field: String,
    /// Added to the carriage base to form the event code.
    pub offset: i64,
    pub name: String,
    pub warn: f64,
    pub crit: f64,
    pub rated_limit: f64,
}

/// On-disk registry layout. Every section is optional.
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    version: Option<u32>,
    families: Option<Vec<FaultFamily>>,
    faults: Option<Vec<FaultDefinition>>,
    thresholds: Option<Vec<ThresholdRule>>,
    life: Option<Vec<LifeRule>>,
}

#[derive(Debug, Clone, Default)]
pub struct FaultRegistry {
    pub version: u32,
    pub families: Vec<FaultFamily>,
    /// Fault table keyed by field name.
    pub faults: BTreeMap<String, FaultDefinition>,
    pub thresholds: Vec<ThresholdRule>,
    /// Service-life rules, in evaluation order.
    pub life: Vec<LifeRule>,
}

impl FaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in families, fault table and threshold rules.
    pub fn with_defaults() -> Self {
        let families = defaults::families();
        let faults = defaults::faults(&families)
            .into_iter()
            .map(|f| (f.field.clone(), f))
            .collect();
        Self {
            version: defaults::DEFAULT_VERSION,
            families,
            faults,
            thresholds: defaults::thresholds(),
            life: defaults::life_rules(),
        }
    }

    /// Built-in defaults overlaid with the registry file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let text = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut registry = Self::with_defaults();
        registry.load_toml(&text)?;
        debug!(
            path = %path.display(),
            version = registry.version,
            faults = registry.faults.len(),
            "Loaded fault registry"
        );
        Ok(registry)
    }

    /// Merge a TOML document into this registry.
    ///
    /// Entries go through the `add_*` upserts, so they replace existing ones
    /// with the same key. The merged registry is validated before it replaces
    /// `self`.
    pub fn load_toml(&mut self, toml_str: &str) -> Result<(), RegistryError> {
        let file: RegistryFile = toml::from_str(toml_str)?;
        let mut merged = self.clone();

        if let Some(version) = file.version {
            merged.version = version;
        }
        file.families.unwrap_or_default().into_iter().for_each(|f| merged.add_family(f));
        file.faults.unwrap_or_default().into_iter().for_each(|f| merged.add_fault(f));
        file.thresholds.unwrap_or_default().into_iter().for_each(|r| merged.add_threshold(r));
        file.life.unwrap_or_default().into_iter().for_each(|r| merged.add_life_rule(r));
        merged.validate()?;
        *self = merged;
        Ok(())
    }

    /// Reject entries that could never be reached or evaluated.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for family in &self.families {
            if family.prefix.is_empty() {
                return Err(RegistryError::Invalid {
                    entry: family.name.clone(),
                    reason: "family prefix is empty".into(),
                });
            }
        }
        for fault in self.faults.values() {
            let family = self
                .families
                .iter()
                .find(|f| f.name == fault.family)
                .ok_or_else(|| RegistryError::Invalid {
                    entry: fault.field.clone(),
                    reason: format!("unknown family '{}'", fault.family),
                })?;
            if !family.matches(&fault.field) {
                return Err(RegistryError::Invalid {
                    entry: fault.field.clone(),
                    reason: format!("field does not carry the '{}' prefix", family.prefix),
                });
            }
        }
        for rule in &self.thresholds {
            if rule.fields.is_empty() {
                return Err(RegistryError::Invalid {
                    entry: rule.code.clone(),
                    reason: "threshold rule has no fields".into(),
                });
            }
            if !rule.limit.is_finite() {
                return Err(RegistryError::Invalid {
                    entry: rule.code.clone(),
                    reason: "threshold limit is not finite".into(),
                });
            }
        }
        for rule in &self.life {
            let tiers = [rule.warn, rule.crit, rule.rated_limit];
            if tiers.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(RegistryError::Invalid {
                    entry: rule.field.clone(),
                    reason: "life limits must be positive and finite".into(),
                });
            }
            if !(rule.warn <= rule.crit && rule.crit <= rule.rated_limit) {
                return Err(RegistryError::Invalid {
                    entry: rule.field.clone(),
                    reason: "expected warn <= crit <= rated_limit".into(),
                });
            }
        }
        Ok(())
    }

    /// The family a field belongs to, if any.
    pub fn match_family(&self, field: &str) -> Option<&FaultFamily> {
        self.families.iter().find(|f| f.matches(field))
    }

    pub fn lookup(&self, field: &str) -> Option<&FaultDefinition> {
        self.faults.get(field)
    }

    /// Insert or replace the family with the same name.
    pub fn add_family(&mut self, family: FaultFamily) {
        match self.families.iter_mut().find(|f| f.name == family.name) {
            Some(existing) => *existing = family,
            None => self.families.push(family),
        }
    }

    pub fn add_fault(&mut self, fault: FaultDefinition) {
        self.faults.insert(fault.field.clone(), fault);
    }

    /// Insert or replace the rule with the same code.
    pub fn add_threshold(&mut self, rule: ThresholdRule) {
        match self.thresholds.iter_mut().find(|r| r.code == rule.code) {
            Some(existing) => *existing = rule,
            None => self.thresholds.push(rule),
        }
    }

    /// Insert or replace the rule for the same field.
    pub fn add_life_rule(&mut self, rule: LifeRule) {
        match self.life.iter_mut().find(|r| r.field == rule.field) {
            Some(existing) => *existing = rule,
            None => self.life.push(rule),
        }
    }
}
