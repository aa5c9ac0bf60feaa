// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use futures_util::StreamExt;
use kp_core::{Collection, Note, Task};
use serde_json::json;
use yare::parameterized;

use super::*;
use crate::sync::store::{Origin, SubscriptionHandle};
use crate::sync::test_helpers::{wait_for, MemoryRemote};

const OWNER: &str = "alice";

#[parameterized(
    forward = { 0, 2, vec!['B', 'C', 'A', 'D'] },
    backward = { 3, 1, vec!['A', 'D', 'B', 'C'] },
    to_end = { 0, 3, vec!['B', 'C', 'D', 'A'] },
    same = { 1, 1, vec!['A', 'B', 'C', 'D'] },
    clamped_to = { 1, 99, vec!['A', 'C', 'D', 'B'] },
    clamped_from = { 99, 0, vec!['D', 'A', 'B', 'C'] },
)]
fn array_move_shifts(from: usize, to: usize, expected: Vec<char>) {
    let mut items = vec!['A', 'B', 'C', 'D'];
    array_move(&mut items, from, to);
    assert_eq!(items, expected);
}

#[test]
fn array_move_on_empty_is_noop() {
    let mut items: Vec<u8> = Vec::new();
    array_move(&mut items, 0, 3);
    assert!(items.is_empty());
}

/// Seeds tasks A..D with ranks 0..3 and returns the subscribed list.
async fn abcd(
    remote: &Arc<MemoryRemote>,
) -> (ReorderableList<Task, MemoryRemote>, Vec<String>, SubscriptionHandle) {
    let keys: Vec<String> = ["A", "B", "C", "D"]
        .iter()
        .map(|title| remote.seed(OWNER, &Task::new(*title)))
        .collect();
    let store = Arc::new(SyncStore::<Task, _>::new(Arc::clone(remote)));
    let (handle, mut stream) = store.subscribe(Some(OWNER)).unwrap();
    let _ = stream.next().await;
    wait_for(|| store.current().len() == 4).await;
    (ReorderableList::new(store).unwrap(), keys, handle)
}

fn titles(list: &ReorderableList<Task, MemoryRemote>) -> Vec<String> {
    list.store()
        .current()
        .iter()
        .map(|e| e.payload.title.clone())
        .collect()
}

#[test]
fn unorderable_collection_is_rejected() {
    let store = Arc::new(SyncStore::<Note, _>::new(MemoryRemote::new()));
    assert!(matches!(ReorderableList::new(store), Err(Error::Validation(_))));
}

#[tokio::test]
async fn reorder_rewrites_every_rank() {
    let remote = MemoryRemote::new();
    let (list, keys, _guard) = abcd(&remote).await;
    remote.clear_calls();

    list.reorder(0, 2).await.unwrap();

    let updates = remote.updates();
    assert_eq!(updates.len(), 4);
    let expected = [(&keys[1], 0), (&keys[2], 1), (&keys[0], 2), (&keys[3], 3)];
    for (key, rank) in expected {
        let (_, fields) = updates.iter().find(|(k, _)| k == key).unwrap();
        assert_eq!(fields.get("order"), Some(&json!(rank)));
        assert_eq!(fields.len(), 1);
    }

    wait_for(|| titles(&list) == vec!["B", "C", "A", "D"]).await;
    let ranks: Vec<_> = list.store().current().iter().map(|e| e.order).collect();
    assert_eq!(ranks, vec![Some(0), Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn reorder_is_visible_before_remote_confirms() {
    let remote = MemoryRemote::new();
    let (list, _keys, _guard) = abcd(&remote).await;
    remote.set_auto_push(false);

    list.reorder(3, 0).await.unwrap();

    let current = list.store().current();
    assert_eq!(current.origin(), Origin::Optimistic);
    assert_eq!(titles(&list), vec!["D", "A", "B", "C"]);
}

#[tokio::test]
async fn same_index_is_noop() {
    let remote = MemoryRemote::new();
    let (list, _keys, _guard) = abcd(&remote).await;
    remote.clear_calls();

    list.reorder(2, 2).await.unwrap();
    list.reorder(7, 9).await.unwrap();

    assert!(remote.calls().is_empty());
    assert_eq!(titles(&list), vec!["A", "B", "C", "D"]);
}

#[tokio::test]
async fn short_list_is_noop() {
    let remote = MemoryRemote::new();
    remote.seed(OWNER, &Task::new("only"));
    let store = Arc::new(SyncStore::<Task, _>::new(remote.clone()));
    let (_handle, mut stream) = store.subscribe(Some(OWNER)).unwrap();
    let _ = stream.next().await;
    let list = ReorderableList::new(store).unwrap();
    remote.clear_calls();

    list.reorder(0, 1).await.unwrap();

    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn concurrent_moves_compose() {
    let remote = MemoryRemote::new();
    let (list, _keys, _guard) = abcd(&remote).await;
    remote.set_auto_push(false);

    let (first, second) = tokio::join!(list.reorder(0, 3), list.reorder(0, 3));
    first.unwrap();
    second.unwrap();

    // Second move acts on the first's result: B C D A -> C D A B
    assert_eq!(titles(&list), vec!["C", "D", "A", "B"]);
}

#[tokio::test]
async fn partial_failure_keeps_optimistic_order() {
    let remote = MemoryRemote::new();
    let (list, keys, _guard) = abcd(&remote).await;
    remote.set_auto_push(false);
    remote.fail_updates_for(&keys[3]);

    let err = list.reorder(0, 1).await.unwrap_err();

    assert!(matches!(err, Error::ReorderFailed { failed: 1, total: 4 }));
    assert_eq!(titles(&list), vec!["B", "A", "C", "D"]);
    assert_eq!(list.store().current().origin(), Origin::Optimistic);
}

#[tokio::test]
async fn server_snapshot_replaces_optimistic_order() {
    let remote = MemoryRemote::new();
    let (list, _keys, _guard) = abcd(&remote).await;
    remote.set_auto_push(false);
    list.reorder(0, 3).await.unwrap();

    remote.push(Collection::Tasks, OWNER);

    wait_for(|| list.store().current().origin() == Origin::Server).await;
    assert_eq!(titles(&list), vec!["B", "C", "D", "A"]);
}

#[tokio::test]
async fn reorder_requires_subscription() {
    let store = Arc::new(SyncStore::<Task, _>::new(MemoryRemote::new()));
    let list = ReorderableList::new(store).unwrap();

    assert!(matches!(list.reorder(0, 1).await, Err(Error::Unauthenticated)));
}
