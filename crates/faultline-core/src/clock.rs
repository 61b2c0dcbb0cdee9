//! Clock policy: which of the two snapshot timestamps is authoritative.
//!
//! Every snapshot and event carries a device-reported time and an ingestion
//! time. Exactly one of them decides "latest" and range membership for a whole
//! deployment. The policy is passed into each component at construction so
//! latest-snapshot selection and range filtering always agree.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The authoritative clock for ordering and range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockPolicy {
    /// Device-reported `event_time`. Production deployments use this.
    #[default]
    #[serde(alias = "PRD", alias = "prd")]
    Device,
    /// Pipeline `ingest_time`. Used where device clocks are not trusted.
    #[serde(alias = "DEV", alias = "dev")]
    Ingest,
}

impl ClockPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Ingest => "ingest",
        }
    }
}

impl fmt::Display for ClockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "device" | "prd" => Ok(Self::Device),
            "ingest" | "dev" => Ok(Self::Ingest),
            other => Err(format!("unknown clock policy: {other}")),
        }
    }
}
