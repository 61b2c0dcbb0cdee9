//! Telemetry, event, and suppression types.

pub mod event;
pub mod mask;
pub mod message;
pub mod snapshot;
pub mod timestamp;
