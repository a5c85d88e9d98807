//! Device-pairing transport.
//!
//! The [`DataLayer`] trait is the seam between the sync pipeline and the
//! platform messaging service that replicates data items between a paired
//! handheld and wearable. Delivery is at-least-once with no ordering
//! guarantee across keys. [`MemoryDataLayer`] implements it in-process for
//! the companion simulator and tests.

pub mod error;
pub mod layer;
pub mod memory;

pub use error::TransportError;
pub use layer::{DataEvent, DataEventKind, DataLayer, TransportFuture};
pub use memory::MemoryDataLayer;

/// Capacity of the change-event bus.
pub const EVENT_BUS_CAPACITY: usize = 64;
