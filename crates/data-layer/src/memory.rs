//! In-process paired transport.
//!
//! Two [`MemoryDataLayer`] nodes created by [`MemoryDataLayer::pair`] share
//! one data-item store, one blob store and one change-event bus, which is
//! how the platform service behaves once both devices are in sync. A put
//! whose content equals the stored item emits no event. Blobs no stored
//! item references anymore are dropped.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use leaguewatch_protocol::{Asset, DataItem};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::EVENT_BUS_CAPACITY;
use crate::error::TransportError;
use crate::layer::{DataEvent, DataEventKind, DataLayer, TransportFuture};

struct Shared {
    items: RwLock<HashMap<String, DataItem>>,
    blobs: RwLock<HashMap<String, Arc<Vec<u8>>>>,
    events: broadcast::Sender<DataEvent>,
    reachable: AtomicBool,
    connect_delay_ms: AtomicU64,
}

/// One node of an in-process device pairing.
pub struct MemoryDataLayer {
    node_id: String,
    shared: Arc<Shared>,
    connected: AtomicBool,
    connect_count: AtomicU64,
}

impl MemoryDataLayer {
    /// Creates two nodes paired with each other.
    pub fn pair() -> (Self, Self) {
        let (events, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let shared = Arc::new(Shared {
            items: RwLock::new(HashMap::new()),
            blobs: RwLock::new(HashMap::new()),
            events,
            reachable: AtomicBool::new(true),
            connect_delay_ms: AtomicU64::new(0),
        });
        (Self::node(Arc::clone(&shared)), Self::node(shared))
    }

    fn node(shared: Arc<Shared>) -> Self {
        Self {
            node_id: uuid::Uuid::new_v4().to_string(),
            shared,
            connected: AtomicBool::new(false),
            connect_count: AtomicU64::new(0),
        }
    }

    /// Makes the pairing service (un)reachable for both nodes.
    ///
    /// Going unreachable also drops existing connections.
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Adds latency to every subsequent connect.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.shared
            .connect_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of successful connects performed by this node.
    pub fn connect_count(&self) -> u64 {
        self.connect_count.load(Ordering::SeqCst)
    }

    /// Returns the stored item on `path`, if any.
    pub fn data_item(&self, path: &str) -> Option<DataItem> {
        self.shared
            .items
            .read()
            .ok()
            .and_then(|items| items.get(path).cloned())
    }

    /// Re-emits the stored item on `path` as a change event.
    ///
    /// Models the transport's at-least-once delivery. Returns false if no
    /// item is stored.
    pub fn redeliver(&self, path: &str) -> bool {
        match self.data_item(path) {
            Some(item) => {
                let _ = self
                    .shared
                    .events
                    .send(DataEvent::changed(item, self.node_id.clone()));
                true
            }
            None => false,
        }
    }

    /// Removes the item on `path` and emits a deletion event.
    pub fn delete_data_item(&self, path: &str) -> bool {
        let removed = self.shared.items.write().ok().and_then(|mut items| {
            let removed = items.remove(path)?;
            if let Ok(mut blobs) = self.shared.blobs.write() {
                retain_referenced(&items, &mut blobs);
            }
            Some(removed)
        });
        match removed {
            Some(item) => {
                let _ = self.shared.events.send(DataEvent {
                    kind: DataEventKind::Deleted,
                    item,
                    source_node: self.node_id.clone(),
                });
                true
            }
            None => false,
        }
    }

    fn ensure_usable(&self) -> Result<(), TransportError> {
        if !self.shared.reachable.load(Ordering::SeqCst) {
            self.connected.store(false, Ordering::SeqCst);
            return Err(TransportError::NotConnected);
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    fn store_item(&self, mut item: DataItem) -> Result<DataItem, TransportError> {
        let unchanged = {
            let mut items = self.shared.items.write().map_err(|_| TransportError::Closed)?;
            let mut blobs = self.shared.blobs.write().map_err(|_| TransportError::Closed)?;
            for asset in item.data.assets_mut() {
                if let Some(bytes) = asset.take_data() {
                    blobs.insert(asset.digest().to_string(), Arc::new(bytes));
                }
            }

            let unchanged = items.get(&item.path) == Some(&item);
            items.insert(item.path.clone(), item.clone());
            retain_referenced(&items, &mut blobs);
            unchanged
        };

        if unchanged {
            trace!(path = %item.path, "put without change, no event emitted");
        } else {
            let receivers = self
                .shared
                .events
                .send(DataEvent::changed(item.clone(), self.node_id.clone()))
                .unwrap_or(0);
            debug!(path = %item.path, node = %self.node_id, receivers, "data item changed");
        }
        Ok(item)
    }
}

/// Drops blobs that no stored item references.
fn retain_referenced(items: &HashMap<String, DataItem>, blobs: &mut HashMap<String, Arc<Vec<u8>>>) {
    let live: HashSet<&str> = items
        .values()
        .flat_map(|item| item.data.assets())
        .map(Asset::digest)
        .collect();
    let before = blobs.len();
    blobs.retain(|digest, _| live.contains(digest.as_str()));
    let evicted = before - blobs.len();
    if evicted > 0 {
        trace!(evicted, remaining = blobs.len(), "unreferenced blobs dropped");
    }
}

impl DataLayer for MemoryDataLayer {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn connect(&self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let delay = self.shared.connect_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if !self.shared.reachable.load(Ordering::SeqCst) {
                return Err(TransportError::Unreachable(
                    "pairing service unavailable".into(),
                ));
            }
            self.connected.store(true, Ordering::SeqCst);
            self.connect_count.fetch_add(1, Ordering::SeqCst);
            debug!(node = %self.node_id, "connected");
            Ok(())
        })
    }

    fn disconnect(&self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if self.connected.swap(false, Ordering::SeqCst) {
                debug!(node = %self.node_id, "disconnected");
            }
            Ok(())
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.shared.reachable.load(Ordering::SeqCst)
    }

    fn put_data_item(&self, item: DataItem) -> TransportFuture<'_, DataItem> {
        Box::pin(async move {
            self.ensure_usable()?;
            self.store_item(item)
        })
    }

    fn fetch_asset(&self, asset: &Asset) -> TransportFuture<'_, Vec<u8>> {
        let digest = asset.digest().to_string();
        Box::pin(async move {
            self.ensure_usable()?;
            let blobs = self.shared.blobs.read().map_err(|_| TransportError::Closed)?;
            blobs
                .get(&digest)
                .map(|b| b.as_ref().clone())
                .ok_or(TransportError::AssetNotFound(digest))
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<DataEvent> {
        self.shared.events.subscribe()
    }
}
