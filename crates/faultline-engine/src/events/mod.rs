//! Read-time event deduplication.

pub mod dedup;

pub use dedup::{EventDeduplicator, EventKey, EventOrder};
