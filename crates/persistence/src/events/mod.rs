//! Event journal module
//!
//! Append-only JSONL writer and replay reader for the audit trail.

pub mod replay;
pub mod store;

pub use replay::{EventFilter, EventReader};
pub use store::EventStore;
