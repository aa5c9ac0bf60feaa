// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Drag-to-reorder over an orderable collection.
//!
//! A move is applied to the local list at once, then every entity's rank is
//! rewritten remotely to its new index. Ranks are always contiguous from 0
//! after a successful move.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use kp_core::document::order_patch;
use kp_core::{Entity, Payload};

use super::remote::RemoteCollections;
use super::store::SyncStore;
use crate::error::{Error, Result};

/// Move the element at `from` to `to`, shifting the others.
///
/// Out of range indices are clamped to the last element.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if items.is_empty() {
        return;
    }
    let last = items.len() - 1;
    let (from, to) = (from.min(last), to.min(last));
    if from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

/// Reorder controller bound to one orderable store.
pub struct ReorderableList<P: Payload, R: RemoteCollections> {
    store: Arc<SyncStore<P, R>>,
}

impl<P: Payload, R: RemoteCollections> ReorderableList<P, R> {
    pub fn new(store: Arc<SyncStore<P, R>>) -> Result<Self> {
        if !P::COLLECTION.is_orderable() {
            return Err(Error::Validation(format!(
                "{} cannot be reordered",
                P::COLLECTION
            )));
        }
        Ok(ReorderableList { store })
    }

    pub fn store(&self) -> &Arc<SyncStore<P, R>> {
        &self.store
    }

    /// Move the entity at `from` to `to`.
    ///
    /// The local list changes on first poll, before any remote call. Issues one
    /// rank update per entity; they run concurrently. If any fail the
    /// optimistic order stays in place until the next pushed snapshot.
    pub async fn reorder(&self, from: usize, to: usize) -> Result<()> {
        let owner_id = self.store.owner_id().ok_or(Error::Unauthenticated)?;

        let planned = self.store.overlay(|current| {
            if current.len() < 2 {
                return None;
            }
            let last = current.len() - 1;
            if from.min(last) == to.min(last) {
                return None;
            }
            let mut next: Vec<Entity<P>> = current.to_vec();
            array_move(&mut next, from, to);
            for (rank, entity) in next.iter_mut().enumerate() {
                entity.order = Some(rank as i64);
            }
            Some(next)
        });

        let Some(snapshot) = planned else {
            debug!("Reorder {} -> {} is a no-op", from, to);
            return Ok(());
        };

        let remote = self.store.remote();
        let updates = snapshot.iter().enumerate().map(|(rank, entity)| {
            remote.update(P::COLLECTION, &owner_id, &entity.key, order_patch(rank as i64))
        });
        let results = join_all(updates).await;

        let total = results.len();
        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            for err in results.iter().filter_map(|r| r.as_ref().err()) {
                warn!("Rank update failed: {}", err);
            }
            return Err(Error::ReorderFailed { failed, total });
        }

        debug!("Reordered {}: {} -> {}", P::COLLECTION, from, to);
        Ok(())
    }
}

#[cfg(test)]
#[path = "reorder_tests.rs"]
mod tests;
