//! Wearable half of the watch face sync.
//!
//! The face asks the handheld for fresh data through the
//! [`TriggerChannel`], receives payloads through the [`PayloadConsumer`],
//! and draws whatever the [`RenderState`] holds. All three share one
//! [`Link`] to the pairing service.

pub mod consumer;
pub mod face;
pub mod link;
pub mod render_state;
pub mod trigger;

pub use consumer::{ApplyOutcome, ConsumeError, ConsumeOutcome, PayloadConsumer};
pub use face::FaceSession;
pub use link::{Link, LinkState, SyncGuard};
pub use render_state::{Freshness, RenderSnapshot, RenderState};
pub use trigger::{TriggerChannel, TriggerOutcome, TriggerReason};
