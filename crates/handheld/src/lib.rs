//! Handheld half of the watch face sync.
//!
//! On every trigger from the wearable the [`SyncService`] resolves the
//! champion to show ([`MatchResolver`]), downloads its splash art and hands
//! the result to the [`PayloadPublisher`].

pub mod error;
pub mod publisher;
pub mod resolver;
pub mod settings;
pub mod sync;

pub use error::SyncError;
pub use publisher::PayloadPublisher;
pub use resolver::{MatchResolver, Resolution, ResolvedChampion, StageTimeouts};
pub use settings::{Settings, SettingsError};
pub use sync::SyncService;
