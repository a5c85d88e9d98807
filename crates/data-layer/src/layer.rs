//! The transport trait and its change events.

use std::future::Future;
use std::pin::Pin;

use leaguewatch_protocol::{Asset, DataItem};
use tokio::sync::broadcast;

use crate::error::TransportError;

/// Boxed future returned by [`DataLayer`] operations.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Kind of change observed on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEventKind {
    Changed,
    Deleted,
}

/// A change notification for one data item.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEvent {
    pub kind: DataEventKind,
    pub item: DataItem,
    /// Node that performed the put.
    pub source_node: String,
}

impl DataEvent {
    pub fn changed(item: DataItem, source_node: impl Into<String>) -> Self {
        Self {
            kind: DataEventKind::Changed,
            item,
            source_node: source_node.into(),
        }
    }

    /// True for a change (not a deletion) on `path`.
    pub fn is_change_on(&self, path: &str) -> bool {
        self.kind == DataEventKind::Changed && self.item.path == path
    }
}

/// Replicated key/value store shared by paired devices.
///
/// Implemented by the platform bridge in production and by
/// [`MemoryDataLayer`](crate::MemoryDataLayer) in-process.
pub trait DataLayer: Send + Sync {
    /// Identifier of the local node.
    fn node_id(&self) -> &str;

    /// Establishes the connection to the pairing service.
    fn connect(&self) -> TransportFuture<'_, ()>;

    /// Drops the connection. Idempotent.
    fn disconnect(&self) -> TransportFuture<'_, ()>;

    /// Whether the last connect succeeded and no disconnect followed.
    fn is_connected(&self) -> bool;

    /// Publishes `item`, replacing any previous item on the same path.
    ///
    /// Inline asset bytes are moved into the blob store; the returned item
    /// (and what observers receive) carries bare asset references.
    fn put_data_item(&self, item: DataItem) -> TransportFuture<'_, DataItem>;

    /// Retrieves the blob behind an asset reference.
    fn fetch_asset(&self, asset: &Asset) -> TransportFuture<'_, Vec<u8>>;

    /// Subscribes to change events from every paired node.
    fn subscribe(&self) -> broadcast::Receiver<DataEvent>;
}
