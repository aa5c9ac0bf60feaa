// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote collection abstraction.
//!
//! Provides a trait-based seam over the live document service that enables:
//! - A WebSocket adapter for production
//! - In-memory fakes for unit testing

use std::future::Future;
use std::pin::Pin;

use kp_core::{Collection, Document, Fields};
use tokio::sync::mpsc;

/// Error type for remote collection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The key does not exist remotely.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The service refused the request (invalid or forbidden).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed before the reply arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// No reply within the request timeout.
    #[error("request timed out")]
    Timeout,
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Boxed future returned by remote writes.
pub type RemoteFuture<'a, T> = Pin<Box<dyn Future<Output = RemoteResult<T>> + Send + 'a>>;

/// A live feed of full document lists for one subscription.
///
/// Every item is the complete, ordered document list at that moment. The
/// channel closes when the subscription is released or the connection drops.
pub struct RemoteFeed {
    /// Id to pass to [`RemoteCollections::unsubscribe`].
    pub id: u64,
    /// Document lists in delivery order.
    pub documents: mpsc::UnboundedReceiver<Vec<Document>>,
}

/// A per-user scoped live document service.
///
/// `subscribe` registers interest and returns at once; document lists then
/// arrive on the feed on the service's own schedule. Writes resolve when the
/// service acknowledges them.
pub trait RemoteCollections: Send + Sync + 'static {
    /// Start a subscription to one owner's documents in a collection.
    fn subscribe(&self, collection: Collection, owner_id: &str) -> RemoteResult<RemoteFeed>;

    /// Release a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: u64);

    /// Create a document and return its server-assigned key.
    fn create(&self, collection: Collection, owner_id: &str, fields: Fields)
        -> RemoteFuture<'_, String>;

    /// Merge fields into an existing document.
    fn update(
        &self,
        collection: Collection,
        owner_id: &str,
        key: &str,
        fields: Fields,
    ) -> RemoteFuture<'_, ()>;

    /// Delete a document. Deleting a missing key succeeds.
    fn delete(&self, collection: Collection, owner_id: &str, key: &str) -> RemoteFuture<'_, ()>;
}
