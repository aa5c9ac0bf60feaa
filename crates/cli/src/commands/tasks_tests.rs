// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use kp_core::Collection;

use super::*;
use crate::sync::test_helpers::MemoryRemote;

const TIMEOUT: Duration = Duration::from_secs(1);

fn registry(remote: &Arc<MemoryRemote>) -> StoreRegistry<MemoryRemote> {
    let registry = StoreRegistry::new(remote.clone());
    registry.sign_in("alice").unwrap();
    registry
}

fn titles(remote: &MemoryRemote) -> Vec<String> {
    remote
        .documents(Collection::Tasks, "alice")
        .into_iter()
        .map(|d| d.fields["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_reorder_persists_ranks() {
    let remote = MemoryRemote::new();
    for title in ["A", "B", "C", "D"] {
        remote.seed("alice", &Task::new(title));
    }
    let mut out = Vec::new();

    reorder(&registry(&remote), 0, 2, TIMEOUT, &mut out)
        .await
        .unwrap();

    assert_eq!(titles(&remote), vec!["B", "C", "A", "D"]);
    let printed = String::from_utf8(out).unwrap();
    let order: Vec<&str> = printed.lines().map(|l| l.rsplit(' ').next().unwrap()).collect();
    assert_eq!(order, vec!["B", "C", "A", "D"]);
}

#[tokio::test]
async fn test_reorder_out_of_range() {
    let remote = MemoryRemote::new();
    remote.seed("alice", &Task::new("A"));
    remote.seed("alice", &Task::new("B"));
    remote.clear_calls();
    let mut out = Vec::new();

    let err = reorder(&registry(&remote), 0, 5, TIMEOUT, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(ref m) if m.contains("out of range")));
    assert!(remote.updates().is_empty());
}

#[tokio::test]
async fn test_reorder_failure_reports_counts() {
    let remote = MemoryRemote::new();
    let keys: Vec<String> = ["A", "B", "C"]
        .iter()
        .map(|t| remote.seed("alice", &Task::new(*t)))
        .collect();
    remote.fail_updates_for(&keys[2]);
    let mut out = Vec::new();

    let err = reorder(&registry(&remote), 2, 0, TIMEOUT, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ReorderFailed { failed: 1, total: 3 }));
}

#[tokio::test]
async fn test_toggle_flips_done() {
    let remote = MemoryRemote::new();
    let key = remote.seed("alice", &Task::new("water plants"));
    let registry = registry(&remote);
    let mut out = Vec::new();

    toggle(&registry, &key, TIMEOUT, &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "[x] water plants\n");
    let docs = remote.documents(Collection::Tasks, "alice");
    assert_eq!(docs[0].fields["done"], serde_json::json!(true));
}

#[tokio::test]
async fn test_toggle_unknown_key() {
    let remote = MemoryRemote::new();
    let mut out = Vec::new();

    let err = toggle(&registry(&remote), "missing", TIMEOUT, &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
    assert!(remote.calls().is_empty());
}
