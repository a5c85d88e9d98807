//! Connection state of the wearable's link to the pairing service.
//!
//! ```text
//! Disconnected -> Connecting -> Idle <-> Syncing
//!       ^             |           |
//!       +-------------+-----------+
//! ```

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use leaguewatch_data_layer::{DataLayer, TransportError};
use leaguewatch_protocol::constants::CONNECT_TIMEOUT;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Link state as seen by the face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    /// Connect attempt in flight.
    Connecting,
    /// Connected, no payload being materialized.
    Idle,
    /// Connected and decoding a received payload.
    Syncing,
}

impl LinkState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Idle | Self::Syncing)
    }
}

/// Owns the transport connection and its state.
///
/// Every entry point that needs the connection (timer, visibility, tap)
/// goes through [`Link::ensure_connected`], which is idempotent and
/// serialized.
pub struct Link {
    layer: Arc<dyn DataLayer>,
    state: watch::Sender<LinkState>,
    connect_lock: Mutex<()>,
    connect_timeout: Duration,
    /// Completed connect attempts.
    attempts: AtomicU64,
    last_failure: StdMutex<Option<TransportError>>,
    active_syncs: AtomicUsize,
}

impl Link {
    pub fn new(layer: Arc<dyn DataLayer>) -> Self {
        Self::with_connect_timeout(layer, CONNECT_TIMEOUT)
    }

    pub fn with_connect_timeout(layer: Arc<dyn DataLayer>, connect_timeout: Duration) -> Self {
        let (state, _) = watch::channel(LinkState::Disconnected);
        Self {
            layer,
            state,
            connect_lock: Mutex::new(()),
            connect_timeout,
            attempts: AtomicU64::new(0),
            last_failure: StdMutex::new(None),
            active_syncs: AtomicUsize::new(0),
        }
    }

    pub fn layer(&self) -> &Arc<dyn DataLayer> {
        &self.layer
    }

    /// Current state. A transport that dropped on its own is reported, and
    /// published to watchers, as `Disconnected`.
    pub fn state(&self) -> LinkState {
        self.observe_drop();
        *self.state.borrow()
    }

    /// Watches state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.state.subscribe()
    }

    fn is_up(&self) -> bool {
        self.state().is_connected()
    }

    fn observe_drop(&self) {
        let dropped = self.state.send_if_modified(|s| {
            if s.is_connected() && !self.layer.is_connected() {
                *s = LinkState::Disconnected;
                true
            } else {
                false
            }
        });
        if dropped {
            debug!("transport dropped, link disconnected");
        }
    }

    fn connected_state(&self) -> LinkState {
        if self.active_syncs.load(Ordering::SeqCst) > 0 {
            LinkState::Syncing
        } else {
            LinkState::Idle
        }
    }

    fn set_state(&self, next: LinkState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            debug!(from = ?prev, to = ?next, "link state changed");
        }
    }

    /// Connects unless already connected.
    ///
    /// A caller that arrives while another attempt is in flight waits for
    /// it and shares its outcome.
    pub async fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.is_up() {
            return Ok(());
        }

        let seen = self.attempts.load(Ordering::SeqCst);
        let _guard = self.connect_lock.lock().await;

        if self.is_up() {
            return Ok(());
        }
        if self.attempts.load(Ordering::SeqCst) != seen {
            let failure = self
                .last_failure
                .lock()
                .map(|f| f.clone())
                .unwrap_or_default();
            if let Some(err) = failure {
                return Err(err);
            }
        }

        self.set_state(LinkState::Connecting);
        let mut attempt = ConnectAttempt {
            link: self,
            finished: false,
        };
        let result = match tokio::time::timeout(self.connect_timeout, self.layer.connect()).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };
        attempt.finished = true;

        if let Ok(mut last) = self.last_failure.lock() {
            *last = result.as_ref().err().cloned();
        }
        self.attempts.fetch_add(1, Ordering::SeqCst);

        match result {
            Ok(()) => {
                self.set_state(self.connected_state());
                info!(node = %self.layer.node_id(), "link connected");
                Ok(())
            }
            Err(e) => {
                self.set_state(LinkState::Disconnected);
                warn!(error = %e, "link connect failed");
                Err(e)
            }
        }
    }

    /// Drops the connection.
    pub async fn disconnect(&self) -> Result<(), TransportError> {
        let _guard = self.connect_lock.lock().await;
        self.layer.disconnect().await?;
        self.set_state(LinkState::Disconnected);
        Ok(())
    }

    /// Marks a payload as being materialized until the guard drops.
    pub fn begin_sync(self: &Arc<Self>) -> SyncGuard {
        self.active_syncs.fetch_add(1, Ordering::SeqCst);
        self.state.send_if_modified(|s| {
            if *s == LinkState::Idle {
                *s = LinkState::Syncing;
                true
            } else {
                false
            }
        });
        SyncGuard {
            link: Arc::clone(self),
        }
    }

    fn finish_sync(&self) {
        let remaining = self.active_syncs.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        if remaining == 0 {
            self.state.send_if_modified(|s| {
                if *s == LinkState::Syncing {
                    *s = LinkState::Idle;
                    true
                } else {
                    false
                }
            });
        }
    }
}

/// Leaves `Connecting` if the caller is cancelled mid-attempt.
struct ConnectAttempt<'a> {
    link: &'a Link,
    finished: bool,
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.link.state.send_if_modified(|s| {
            if *s == LinkState::Connecting {
                *s = LinkState::Disconnected;
                true
            } else {
                false
            }
        });
        debug!("connect attempt cancelled");
    }
}

/// Returns the link to Idle when the last in-flight sync finishes.
pub struct SyncGuard {
    link: Arc<Link>,
}

impl Drop for SyncGuard {
    fn drop(&mut self) {
        self.link.finish_sync();
    }
}
