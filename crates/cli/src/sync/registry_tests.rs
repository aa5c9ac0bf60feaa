// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use kp_core::{Collection, Note, Task};

use super::*;
use crate::sync::test_helpers::MemoryRemote;

#[test]
fn open_requires_sign_in() {
    let registry = StoreRegistry::new(MemoryRemote::new());

    assert!(matches!(registry.open::<Note>(), Err(Error::Unauthenticated)));
    assert!(matches!(registry.sign_in(" "), Err(Error::Unauthenticated)));
    assert!(registry.is_empty());
}

#[tokio::test]
async fn same_pair_returns_same_store() {
    let registry = StoreRegistry::new(MemoryRemote::new());
    registry.sign_in("alice").unwrap();

    let first = registry.open::<Note>().unwrap();
    let second = registry.open::<Note>().unwrap();
    let tasks = registry.open::<Task>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(tasks.collection(), Collection::Tasks);
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.remote().feed_count(), 2);
}

#[tokio::test]
async fn open_with_stream_only_streams_new_stores() {
    let registry = StoreRegistry::new(MemoryRemote::new());
    registry.sign_in("alice").unwrap();

    let (_, stream) = registry.open_with_stream::<Note>().unwrap();
    assert!(stream.is_some());
    let (_, stream) = registry.open_with_stream::<Note>().unwrap();
    assert!(stream.is_none());
}

#[tokio::test]
async fn sign_out_releases_every_store() {
    let remote = MemoryRemote::new();
    let registry = StoreRegistry::new(remote.clone());
    registry.sign_in("alice").unwrap();
    registry.open::<Note>().unwrap();
    registry.open::<Task>().unwrap();

    registry.sign_out();

    assert!(registry.is_empty());
    assert_eq!(registry.owner(), None);
    assert_eq!(remote.feed_count(), 0);
    assert!(matches!(registry.open::<Note>(), Err(Error::Unauthenticated)));
}

#[tokio::test]
async fn switching_owner_drops_previous_stores() {
    let remote = MemoryRemote::new();
    let registry = StoreRegistry::new(remote.clone());
    registry.sign_in("alice").unwrap();
    let alice = registry.open::<Note>().unwrap();

    registry.sign_in("bob").unwrap();
    let bob = registry.open::<Note>().unwrap();

    assert!(!Arc::ptr_eq(&alice, &bob));
    assert_eq!(bob.owner_id().as_deref(), Some("bob"));
    assert_eq!(registry.len(), 1);
    assert_eq!(remote.feed_count(), 1);
}

#[tokio::test]
async fn signing_in_again_keeps_stores() {
    let registry = StoreRegistry::new(MemoryRemote::new());
    registry.sign_in("alice").unwrap();
    let before = registry.open::<Note>().unwrap();

    registry.sign_in("alice").unwrap();

    assert!(Arc::ptr_eq(&before, &registry.open::<Note>().unwrap()));
}

#[tokio::test]
async fn close_releases_one_store() {
    let remote = MemoryRemote::new();
    let registry = StoreRegistry::new(remote.clone());
    registry.sign_in("alice").unwrap();
    registry.open::<Note>().unwrap();
    registry.open::<Task>().unwrap();

    assert!(registry.close(Collection::Notes));
    assert!(!registry.close(Collection::Notes));

    assert_eq!(registry.len(), 1);
    assert_eq!(remote.feed_count(), 1);
}
