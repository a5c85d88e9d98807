//! Sync requests from the wearable to the handheld.
//!
//! A request is a fresh timestamp written to `/league`; the handheld
//! reacts to the change. Nothing is awaited in return: the payload arrives
//! later on `/league_back`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use leaguewatch_data_layer::TransportError;
use leaguewatch_protocol::constants::RECONNECT_INTERVAL;
use leaguewatch_protocol::{MonotonicClock, TriggerRecord};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::link::Link;

/// Why a sync was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// The link just came up.
    Connected,
    /// The face became visible.
    Visible,
    /// The user tapped the face.
    Tap,
    /// Periodic refresh.
    Timer,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connected => "connected",
            Self::Visible => "visible",
            Self::Tap => "tap",
            Self::Timer => "timer",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Published { produced_at_millis: i64 },
    /// The link could not be brought up; nothing was written.
    Skipped,
}

/// Writes trigger records on `/league`.
pub struct TriggerChannel {
    link: Arc<Link>,
    clock: MonotonicClock,
    period: Duration,
}

impl TriggerChannel {
    pub fn new(link: Arc<Link>) -> Self {
        Self {
            link,
            clock: MonotonicClock::new(),
            period: RECONNECT_INTERVAL,
        }
    }

    /// Overrides the periodic refresh interval.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn link(&self) -> &Arc<Link> {
        &self.link
    }

    /// Connects if needed and writes a new trigger record.
    pub async fn request_sync(&self, reason: TriggerReason) -> Result<TriggerOutcome, TransportError> {
        if let Err(e) = self.link.ensure_connected().await {
            warn!(%reason, error = %e, "link unavailable, sync request skipped");
            return Ok(TriggerOutcome::Skipped);
        }

        let record = TriggerRecord {
            produced_at_millis: self.clock.next_millis(),
        };
        self.link.layer().put_data_item(record.to_data_item()).await?;

        debug!(%reason, time = record.produced_at_millis, "sync requested");
        Ok(TriggerOutcome::Published {
            produced_at_millis: record.produced_at_millis,
        })
    }

    /// Requests a sync every period until `cancel` fires.
    pub async fn run_periodic(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs(), "periodic sync started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.request_sync(TriggerReason::Timer).await {
                        warn!(error = %e, "periodic sync request failed");
                    }
                }
            }
        }
        debug!("periodic sync stopped");
    }
}
