// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registry of live stores.
//!
//! Stores are keyed by `(collection, owner)`. Opening the same pair twice
//! returns the same store. Signing out drops every store and releases its
//! subscription.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use kp_core::{Collection, Payload};

use super::remote::RemoteCollections;
use super::store::{SnapshotStream, SubscriptionHandle, SyncStore};
use crate::error::{Error, Result};

type StoreKey = (Collection, String);

struct Entry {
    store: Arc<dyn Any + Send + Sync>,
    handle: Option<SubscriptionHandle>,
}

struct Inner {
    owner: Option<String>,
    entries: HashMap<StoreKey, Entry>,
}

/// Owns one store per `(collection, owner)` for the signed-in user.
pub struct StoreRegistry<R: RemoteCollections> {
    remote: Arc<R>,
    inner: Mutex<Inner>,
}

impl<R: RemoteCollections> StoreRegistry<R> {
    pub fn new(remote: Arc<R>) -> Self {
        StoreRegistry {
            remote,
            inner: Mutex::new(Inner {
                owner: None,
                entries: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn owner(&self) -> Option<String> {
        self.lock().owner.clone()
    }

    /// Set the current user. Switching users signs the previous one out.
    pub fn sign_in(&self, owner_id: &str) -> Result<()> {
        let owner_id = owner_id.trim();
        if owner_id.is_empty() {
            return Err(Error::Unauthenticated);
        }

        let stale = {
            let mut inner = self.lock();
            if inner.owner.as_deref() == Some(owner_id) {
                return Ok(());
            }
            inner.owner = Some(owner_id.to_string());
            std::mem::take(&mut inner.entries)
        };
        info!("Signed in as {}", owner_id);
        // Handles release outside the lock
        drop(stale);
        Ok(())
    }

    /// Forget the current user and release every store.
    pub fn sign_out(&self) {
        let stale = {
            let mut inner = self.lock();
            inner.owner = None;
            std::mem::take(&mut inner.entries)
        };
        if !stale.is_empty() {
            debug!("Releasing {} stores on sign out", stale.len());
        }
        drop(stale);
    }

    /// Get or create the subscribed store for `P` and the current user.
    ///
    /// Creating a store subscribes it, which needs a running tokio runtime.
    pub fn open<P: Payload>(&self) -> Result<Arc<SyncStore<P, R>>> {
        self.open_with_stream::<P>().map(|(store, _)| store)
    }

    /// Like [`StoreRegistry::open`], also returning a snapshot stream when the
    /// store was newly created.
    pub fn open_with_stream<P: Payload>(
        &self,
    ) -> Result<(Arc<SyncStore<P, R>>, Option<SnapshotStream<P>>)> {
        let mut inner = self.lock();
        let owner_id = inner.owner.clone().ok_or(Error::Unauthenticated)?;
        let key = (P::COLLECTION, owner_id.clone());

        if let Some(entry) = inner.entries.get(&key) {
            let store = Arc::clone(&entry.store)
                .downcast::<SyncStore<P, R>>()
                .map_err(|_| {
                    Error::Validation(format!("store for {} has another type", P::COLLECTION))
                })?;
            return Ok((store, None));
        }

        let store = Arc::new(SyncStore::<P, R>::new(Arc::clone(&self.remote)));
        let (handle, stream) = store.subscribe(Some(&owner_id))?;
        let erased: Arc<dyn Any + Send + Sync> = store.clone();
        inner.entries.insert(
            key,
            Entry {
                store: erased,
                handle: Some(handle),
            },
        );
        debug!("Opened {} store for {}", P::COLLECTION, owner_id);
        Ok((store, Some(stream)))
    }

    /// Release the current user's store for `collection`, if open.
    pub fn close(&self, collection: Collection) -> bool {
        let removed = {
            let mut inner = self.lock();
            let Some(owner_id) = inner.owner.clone() else {
                return false;
            };
            inner.entries.remove(&(collection, owner_id))
        };
        match removed {
            Some(mut entry) => {
                if let Some(handle) = entry.handle.take() {
                    handle.unsubscribe();
                }
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
