//! Error types for the pairing transport.

/// Errors produced by a [`DataLayer`](crate::DataLayer).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("not connected")]
    NotConnected,

    #[error("peer unreachable: {0}")]
    Unreachable(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("transport operation timed out")]
    Timeout,

    #[error("transport closed")]
    Closed,
}
