// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use kp_core::document::ServerTimestamp;
use kp_core::{Collection, Database, Document, Fields, Payload};
use tokio::sync::mpsc;

use super::remote::{RemoteCollections, RemoteError, RemoteFeed, RemoteFuture, RemoteResult};

/// One write observed by [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { collection: Collection, fields: Fields },
    Update { key: String, fields: Fields },
    Delete { key: String },
}

struct Feed {
    collection: Collection,
    owner_id: String,
    tx: mpsc::UnboundedSender<Vec<Document>>,
}

/// In-memory remote service backed by an in-memory document database.
///
/// Pushes the full document list to every matching feed after each write,
/// unless auto-push is turned off.
pub struct MemoryRemote {
    db: Mutex<Database>,
    feeds: Mutex<HashMap<u64, Feed>>,
    next_id: AtomicU64,
    calls: Mutex<Vec<Call>>,
    failing_keys: Mutex<HashSet<String>>,
    unsubscribed: Mutex<Vec<u64>>,
    auto_push: AtomicBool,
    strict_delete: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryRemote {
            db: Mutex::new(Database::open_in_memory().unwrap()),
            feeds: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            failing_keys: Mutex::new(HashSet::new()),
            unsubscribed: Mutex::new(Vec::new()),
            auto_push: AtomicBool::new(true),
            strict_delete: AtomicBool::new(false),
        })
    }

    /// Store a document directly, without recording a call or pushing.
    pub fn seed<P: Payload>(&self, owner_id: &str, payload: &P) -> String {
        let fields = payload.to_fields().unwrap();
        self.db
            .lock()
            .unwrap()
            .create_document(P::COLLECTION, owner_id, fields, ServerTimestamp::now())
            .unwrap()
            .key
    }

    /// Store a raw document, bypassing payload encoding.
    pub fn seed_fields(&self, collection: Collection, owner_id: &str, fields: Fields) -> String {
        self.db
            .lock()
            .unwrap()
            .create_document(collection, owner_id, fields, ServerTimestamp::now())
            .unwrap()
            .key
    }

    pub fn documents(&self, collection: Collection, owner_id: &str) -> Vec<Document> {
        self.db
            .lock()
            .unwrap()
            .list_documents(collection, owner_id)
            .unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Updates recorded so far, as `(key, fields)`.
    pub fn updates(&self) -> Vec<(String, Fields)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update { key, fields } => Some((key, fields)),
                _ => None,
            })
            .collect()
    }

    /// Make every update to `key` fail.
    pub fn fail_updates_for(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn set_auto_push(&self, enabled: bool) {
        self.auto_push.store(enabled, Ordering::SeqCst);
    }

    /// Report deletes of missing keys as not found.
    pub fn set_strict_delete(&self, strict: bool) {
        self.strict_delete.store(strict, Ordering::SeqCst);
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.lock().unwrap().len()
    }

    pub fn unsubscribed(&self) -> Vec<u64> {
        self.unsubscribed.lock().unwrap().clone()
    }

    /// Push the current list to every feed for `collection` and `owner_id`.
    pub fn push(&self, collection: Collection, owner_id: &str) {
        let docs = self.documents(collection, owner_id);
        let feeds = self.feeds.lock().unwrap();
        for feed in feeds.values() {
            if feed.collection == collection && feed.owner_id == owner_id {
                let _ = feed.tx.send(docs.clone());
            }
        }
    }

    /// Push an arbitrary list to every feed for `collection` and `owner_id`.
    pub fn push_documents(&self, collection: Collection, owner_id: &str, docs: Vec<Document>) {
        let feeds = self.feeds.lock().unwrap();
        for feed in feeds.values() {
            if feed.collection == collection && feed.owner_id == owner_id {
                let _ = feed.tx.send(docs.clone());
            }
        }
    }

    /// End every feed for `collection` and `owner_id` from the service side.
    pub fn end_feeds(&self, collection: Collection, owner_id: &str) {
        self.feeds
            .lock()
            .unwrap()
            .retain(|_, feed| feed.collection != collection || feed.owner_id != owner_id);
    }

    fn changed(&self, collection: Collection, owner_id: &str) {
        if self.auto_push.load(Ordering::SeqCst) {
            self.push(collection, owner_id);
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn remote_error(err: kp_core::Error) -> RemoteError {
    match err {
        kp_core::Error::NotFound(key) => RemoteError::NotFound(key),
        other => RemoteError::Rejected(other.to_string()),
    }
}

impl RemoteCollections for MemoryRemote {
    fn subscribe(&self, collection: Collection, owner_id: &str) -> RemoteResult<RemoteFeed> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().unwrap().insert(
            id,
            Feed {
                collection,
                owner_id: owner_id.to_string(),
                tx,
            },
        );
        self.changed(collection, owner_id);
        Ok(RemoteFeed { id, documents: rx })
    }

    fn unsubscribe(&self, id: u64) {
        self.feeds.lock().unwrap().remove(&id);
        self.unsubscribed.lock().unwrap().push(id);
    }

    fn create(
        &self,
        collection: Collection,
        owner_id: &str,
        fields: Fields,
    ) -> RemoteFuture<'_, String> {
        let owner_id = owner_id.to_string();
        Box::pin(async move {
            self.record(Call::Create {
                collection,
                fields: fields.clone(),
            });
            let doc = self
                .db
                .lock()
                .unwrap()
                .create_document(collection, &owner_id, fields, ServerTimestamp::now())
                .map_err(remote_error)?;
            self.changed(collection, &owner_id);
            Ok(doc.key)
        })
    }

    fn update(
        &self,
        collection: Collection,
        owner_id: &str,
        key: &str,
        fields: Fields,
    ) -> RemoteFuture<'_, ()> {
        let owner_id = owner_id.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.record(Call::Update {
                key: key.clone(),
                fields: fields.clone(),
            });
            if self.failing_keys.lock().unwrap().contains(&key) {
                return Err(RemoteError::ConnectionFailed("injected failure".into()));
            }
            self.db
                .lock()
                .unwrap()
                .update_document(collection, &owner_id, &key, fields)
                .map_err(remote_error)?;
            self.changed(collection, &owner_id);
            Ok(())
        })
    }

    fn delete(&self, collection: Collection, owner_id: &str, key: &str) -> RemoteFuture<'_, ()> {
        let owner_id = owner_id.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.record(Call::Delete { key: key.clone() });
            let removed = self
                .db
                .lock()
                .unwrap()
                .delete_document(collection, &owner_id, &key)
                .map_err(remote_error)?;
            if !removed && self.strict_delete.load(Ordering::SeqCst) {
                return Err(RemoteError::NotFound(key));
            }
            if removed {
                self.changed(collection, &owner_id);
            }
            Ok(())
        })
    }
}

/// Poll `check` until it holds, failing the test after about a second.
pub async fn wait_for<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(check(), "condition not reached in time");
}
