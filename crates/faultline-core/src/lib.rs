//! # faultline-core
//!
//! Foundation crate for the Faultline fault aggregation engine.
//! Defines the telemetry types, storage traits, errors, config, clock policy,
//! and tracing setup. Every other crate in the workspace depends on this.

pub mod clock;
pub mod config;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use clock::ClockPolicy;
pub use config::FaultlineConfig;
pub use errors::error_code::FaultlineErrorCode;
pub use errors::StorageError;
pub use types::event::{EventFilter, FaultEvent, TimeRange};
pub use types::mask::{MaskRecord, MaskResolution};
pub use types::snapshot::{FieldBag, Snapshot};
