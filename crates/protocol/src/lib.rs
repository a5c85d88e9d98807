//! Shared wire types for the League watch face.
//!
//! Both halves of the pipeline (the handheld companion and the wearable
//! face) exchange *data items*: a channel path plus a small key/value map
//! that may reference binary assets. This crate defines those maps, the two
//! records carried over them, and the constants both sides agree on.

pub mod clock;
pub mod constants;
pub mod data_map;
pub mod records;

// Re-export primary types for convenience.
pub use clock::MonotonicClock;
pub use data_map::{Asset, DataItem, DataMap, DataValue};
pub use records::{RecordError, SyncRecord, SyncRecordRef, TriggerRecord};
