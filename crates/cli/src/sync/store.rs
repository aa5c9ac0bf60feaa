// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live synchronized store for one user-scoped collection.
//!
//! The store keeps an in-memory ordered snapshot that is only ever replaced
//! wholesale: by a snapshot pushed from the remote service, or by the
//! optimistic reorder path. Writes go to the remote service and become
//! visible when the service pushes the next snapshot.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use kp_core::document::{check_patch, ORDER_FIELD};
use kp_core::payload::check_fields;
use kp_core::{Collection, Document, Entity, Fields, Payload};

use super::remote::{RemoteCollections, RemoteError};
use crate::error::{Error, Result};

/// Where the current snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Nothing delivered yet.
    Empty,
    /// Last state pushed by the remote service.
    Server,
    /// Local reorder not yet confirmed by the remote service.
    Optimistic,
}

/// An immutable, cheaply cloned view of a collection.
#[derive(Debug)]
pub struct Snapshot<P> {
    entities: Arc<Vec<Entity<P>>>,
    origin: Origin,
}

impl<P> Clone for Snapshot<P> {
    fn clone(&self) -> Self {
        Snapshot {
            entities: Arc::clone(&self.entities),
            origin: self.origin,
        }
    }
}

impl<P> Snapshot<P> {
    pub fn empty() -> Self {
        Snapshot {
            entities: Arc::new(Vec::new()),
            origin: Origin::Empty,
        }
    }

    pub(crate) fn optimistic(entities: Vec<Entity<P>>) -> Self {
        Snapshot {
            entities: Arc::new(entities),
            origin: Origin::Optimistic,
        }
    }

    pub fn entities(&self) -> &[Entity<P>] {
        &self.entities
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity<P>> {
        self.entities.iter()
    }

    /// Keys in snapshot order.
    pub fn keys(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn get(&self, key: &str) -> Option<&Entity<P>> {
        self.entities.iter().find(|e| e.key == key)
    }
}

impl<P: Payload> Snapshot<P> {
    /// Maps a pushed document list into the local entity shape.
    ///
    /// Undecodable and duplicate documents are skipped with a warning.
    /// Orderable collections are sorted by rank, unranked last.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut seen = HashSet::with_capacity(documents.len());
        let mut entities = Vec::with_capacity(documents.len());

        for doc in documents {
            if !seen.insert(doc.key.clone()) {
                warn!("Skipping duplicate key {} in {}", doc.key, P::COLLECTION);
                continue;
            }
            let key = doc.key.clone();
            match Entity::<P>::from_document(doc) {
                Ok(entity) => entities.push(entity),
                Err(e) => warn!("Skipping undecodable {} document {}: {}", P::COLLECTION, key, e),
            }
        }

        if P::COLLECTION.is_orderable() {
            entities.sort_by_key(|e| (e.order.is_none(), e.order));
        }

        Snapshot {
            entities: Arc::new(entities),
            origin: Origin::Server,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Scoped ownership of one live subscription.
///
/// Released by [`SubscriptionHandle::unsubscribe`] or on drop, whichever
/// comes first.
pub struct SubscriptionHandle {
    feed_id: u64,
    collection: Collection,
    owner_id: String,
    remote: Arc<dyn RemoteCollections>,
    pump: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Release the subscription and close its snapshot stream.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
        self.remote.unsubscribe(self.feed_id);
        debug!(
            "Released subscription to {}/{}",
            self.collection, self.owner_id
        );
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Ordered stream of snapshots for one subscription.
///
/// Lazy and unbounded: it yields whenever the remote service pushes, and
/// ends once its subscription is released.
pub struct SnapshotStream<P> {
    rx: mpsc::UnboundedReceiver<Snapshot<P>>,
    active: Arc<AtomicBool>,
}

impl<P> Unpin for SnapshotStream<P> {}

impl<P> Stream for SnapshotStream<P> {
    type Item = Snapshot<P>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.active.load(Ordering::SeqCst) {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

/// Synchronized store for one collection, generic over its payload.
pub struct SyncStore<P: Payload, R: RemoteCollections> {
    remote: Arc<R>,
    owner: Mutex<Option<String>>,
    state: Arc<watch::Sender<Snapshot<P>>>,
    generation: Arc<AtomicU64>,
    live: Arc<Mutex<Option<mpsc::UnboundedSender<Snapshot<P>>>>>,
    _payload: PhantomData<fn() -> P>,
}

impl<P: Payload, R: RemoteCollections> SyncStore<P, R> {
    pub fn new(remote: Arc<R>) -> Self {
        let (state, _) = watch::channel(Snapshot::empty());
        SyncStore {
            remote,
            owner: Mutex::new(None),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            live: Arc::new(Mutex::new(None)),
            _payload: PhantomData,
        }
    }

    pub fn collection(&self) -> Collection {
        P::COLLECTION
    }

    pub(crate) fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Owner of the most recent subscription.
    pub fn owner_id(&self) -> Option<String> {
        lock(&self.owner).clone()
    }

    fn require_owner(&self) -> Result<String> {
        self.owner_id().ok_or(Error::Unauthenticated)
    }

    /// The current snapshot, including any optimistic overlay.
    pub fn current(&self) -> Snapshot<P> {
        self.state.borrow().clone()
    }

    /// Observe the latest snapshot. Intermediate values may be skipped.
    pub fn changes(&self) -> watch::Receiver<Snapshot<P>> {
        self.state.subscribe()
    }

    /// Begin a live subscription to `owner_id`'s documents.
    ///
    /// Returns immediately; snapshots arrive on the stream as the remote
    /// service pushes them. The local snapshot starts empty. Subscribing
    /// again starts a fresh, independent delivery that takes over the local
    /// snapshot. The stream ends if the remote service ends the feed.
    ///
    /// Delivery runs on the current tokio runtime; called outside one this
    /// fails with [`Error::Sync`] before contacting the remote service.
    pub fn subscribe(&self, owner_id: Option<&str>) -> Result<(SubscriptionHandle, SnapshotStream<P>)> {
        let owner_id = match owner_id.map(str::trim) {
            Some(owner) if !owner.is_empty() => owner.to_string(),
            _ => return Err(Error::Unauthenticated),
        };

        let runtime = Handle::try_current()
            .map_err(|_| Error::Sync("subscribe needs a running tokio runtime".to_string()))?;
        let mut feed = self.remote.subscribe(P::COLLECTION, &owner_id)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        *lock(&self.owner) = Some(owner_id.clone());
        self.state.send_replace(Snapshot::empty());

        let (tx, rx) = mpsc::unbounded_channel();
        *lock(&self.live) = Some(tx.clone());

        let active = Arc::new(AtomicBool::new(true));
        let pump = {
            let state = Arc::clone(&self.state);
            let current_generation = Arc::clone(&self.generation);
            let active = Arc::clone(&active);
            let live = Arc::clone(&self.live);
            runtime.spawn(async move {
                while let Some(documents) = feed.documents.recv().await {
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    let snapshot = Snapshot::<P>::from_documents(documents);
                    debug!("{} snapshot: {} entities", P::COLLECTION, snapshot.len());
                    if current_generation.load(Ordering::SeqCst) == generation {
                        state.send_replace(snapshot.clone());
                    }
                    // Nobody listening is fine: the store still tracks it
                    let _ = tx.send(snapshot);
                }
                // Feed ended remotely: close the stream unless superseded
                if current_generation.load(Ordering::SeqCst) == generation {
                    *lock(&live) = None;
                }
                debug!("{} feed for generation {} ended", P::COLLECTION, generation);
            })
        };

        let remote: Arc<dyn RemoteCollections> = self.remote.clone();
        let handle = SubscriptionHandle {
            feed_id: feed.id,
            collection: P::COLLECTION,
            owner_id,
            remote,
            pump: Some(pump),
            active: Arc::clone(&active),
        };
        Ok((handle, SnapshotStream { rx, active }))
    }

    /// Release a subscription obtained from [`SyncStore::subscribe`].
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        handle.unsubscribe();
    }

    /// Validate and create an entity. Resolves with the new key once the
    /// remote service acknowledges; the entity appears with the next snapshot.
    pub async fn create(&self, payload: P) -> Result<String> {
        payload.validate()?;
        let owner_id = self.require_owner()?;
        let fields = payload.to_fields()?;

        let key = self.remote.create(P::COLLECTION, &owner_id, fields).await?;
        debug!("Created {} {}", P::COLLECTION, key);
        Ok(key)
    }

    /// Merge a partial payload into an existing entity.
    ///
    /// `patch` must serialize to an object. Unknown keys fail remotely with
    /// [`Error::NotFound`].
    pub async fn update(&self, key: &str, patch: impl Serialize) -> Result<()> {
        let patch = match serde_json::to_value(patch)? {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(Error::Validation(format!(
                    "update must be an object of fields, got {other}"
                )))
            }
        };
        self.update_fields(key, patch).await
    }

    /// Merge raw fields into an existing entity.
    ///
    /// When the entity is in the local snapshot the merged result must still
    /// decode as `P`; otherwise the patch is rejected without a remote call.
    pub async fn update_fields(&self, key: &str, patch: Fields) -> Result<()> {
        check_patch(P::COLLECTION, &patch)?;
        let owner_id = self.require_owner()?;
        self.check_merged(key, &patch)?;

        self.remote
            .update(P::COLLECTION, &owner_id, key, patch)
            .await?;
        debug!("Updated {} {}", P::COLLECTION, key);
        Ok(())
    }

    fn check_merged(&self, key: &str, patch: &Fields) -> Result<()> {
        let current = self.current();
        let Some(entity) = current.get(key) else {
            return Ok(());
        };
        let mut merged = entity.payload.to_fields()?;
        for (name, value) in patch {
            if name != ORDER_FIELD {
                merged.insert(name.clone(), value.clone());
            }
        }
        check_fields(P::COLLECTION, &merged)?;
        Ok(())
    }

    /// Delete an entity. Deleting a missing key succeeds.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let owner_id = self.require_owner()?;

        match self.remote.delete(P::COLLECTION, &owner_id, key).await {
            Ok(()) => {}
            Err(RemoteError::NotFound(_)) => debug!("Delete of missing {} {}", P::COLLECTION, key),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Atomically replace the local list with an optimistic one.
    ///
    /// `plan` sees the latest local list, overlay included. Returning `None`
    /// leaves the snapshot untouched.
    pub(crate) fn overlay<F>(&self, plan: F) -> Option<Snapshot<P>>
    where
        F: FnOnce(&[Entity<P>]) -> Option<Vec<Entity<P>>>,
    {
        let mut applied = None;
        self.state.send_if_modified(|current| match plan(current.entities()) {
            Some(entities) => {
                *current = Snapshot::optimistic(entities);
                applied = Some(current.clone());
                true
            }
            None => false,
        });

        if let Some(snapshot) = &applied {
            if let Some(tx) = lock(&self.live).as_ref() {
                let _ = tx.send(snapshot.clone());
            }
        }
        applied
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
