//! What the renderer draws: the last applied splash and text.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use image::RgbaImage;

/// Immutable view of the render state at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderSnapshot {
    pub bitmap: Option<Arc<RgbaImage>>,
    pub text: String,
    /// Producer timestamp of the applied record.
    pub produced_at_millis: Option<i64>,
    /// Local time the record was applied.
    pub updated_at: Option<DateTime<Utc>>,
}

/// How current the displayed payload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing received yet.
    Empty,
    Fresh,
    /// Last update is older than the threshold.
    Stale { since: DateTime<Utc> },
}

impl RenderSnapshot {
    pub fn freshness(&self, now: DateTime<Utc>, threshold: Duration) -> Freshness {
        let Some(updated_at) = self.updated_at else {
            return Freshness::Empty;
        };
        let age = (now - updated_at).to_std().unwrap_or_default();
        if age > threshold {
            Freshness::Stale { since: updated_at }
        } else {
            Freshness::Fresh
        }
    }
}

/// Process-wide render state.
///
/// The consumer swaps whole snapshots; readers clone an `Arc` and never
/// observe a bitmap from one record with text from another.
#[derive(Debug, Default)]
pub struct RenderState {
    current: RwLock<Arc<RenderSnapshot>>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<RenderSnapshot> {
        match self.current.read() {
            Ok(current) => Arc::clone(&current),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub(crate) fn apply(
        &self,
        bitmap: RgbaImage,
        text: String,
        produced_at_millis: i64,
        updated_at: DateTime<Utc>,
    ) {
        let next = Arc::new(RenderSnapshot {
            bitmap: Some(Arc::new(bitmap)),
            text,
            produced_at_millis: Some(produced_at_millis),
            updated_at: Some(updated_at),
        });
        match self.current.write() {
            Ok(mut current) => *current = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}
