//! # faultline-engine
//!
//! The fault aggregation and suppression engine.
//!
//! - `registry`: typed fault table, family prefixes, threshold and life rules
//! - `extractor` / `thresholds`: per-snapshot alarm and warning evaluation
//! - `life`: component service-life tiers
//! - `reconcile`: clears masks whose fault has physically resolved
//! - `aggregator`: per-group alarm/warning counts excluding masked faults
//! - `events`: latest-per-key event deduplication
//! - `ingest`: decodes parsed-signal messages into the snapshot store
//! - `service`: `FaultEngine`, the transport-facing facade

pub mod aggregator;
pub mod errors;
pub mod events;
pub mod extractor;
pub mod ingest;
pub mod life;
pub mod reconcile;
pub mod registry;
pub mod service;
pub mod thresholds;

pub use aggregator::{GroupCounts, GroupSummary, UnitAssessment};
pub use errors::{FaultError, FaultResult};
pub use events::{EventDeduplicator, EventOrder};
pub use extractor::ExtractionReport;
pub use ingest::Ingestor;
pub use life::{LifeHit, LifeTier};
pub use reconcile::{ReconcileGuard, ReconcileOutcome, Reconciler};
pub use registry::FaultRegistry;
pub use service::{AlarmHit, EngineHealth, EventQuery, FaultEngine, MaskAck};
