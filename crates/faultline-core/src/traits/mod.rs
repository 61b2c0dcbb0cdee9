//! Storage traits consumed by the engine.

pub mod storage;

pub use storage::{
    IEventLog, IFaultStorage, ISnapshotReader, ISuppressionStore, ITelemetryWriter, StorageHealth,
};
