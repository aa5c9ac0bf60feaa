// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use kp_core::{LedgerKind, Note, Task};
use similar_asserts::assert_eq;

use super::*;
use crate::sync::test_helpers::MemoryRemote;

const TIMEOUT: Duration = Duration::from_secs(1);

fn registry(remote: &std::sync::Arc<MemoryRemote>) -> StoreRegistry<MemoryRemote> {
    let registry = StoreRegistry::new(remote.clone());
    registry.sign_in("alice").unwrap();
    registry
}

fn entry(title: &str, amount: f64, kind: LedgerKind) -> LedgerEntry {
    LedgerEntry {
        title: title.to_string(),
        amount,
        kind,
        category: String::new(),
        date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
    }
}

#[tokio::test]
async fn test_list_text_in_rank_order() {
    let remote = MemoryRemote::new();
    let a = remote.seed("alice", &Task::new("first"));
    let b = remote.seed("alice", &Task::new("second"));
    remote.seed("bob", &Task::new("hidden"));

    let mut out = Vec::new();
    run::<Task, _, _>(&registry(&remote), TIMEOUT, false, &mut out)
        .await
        .unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("{a}  [ ] first\n{b}  [ ] second\n")
    );
}

#[tokio::test]
async fn test_list_json() {
    let remote = MemoryRemote::new();
    let key = remote.seed(
        "alice",
        &Note {
            title: "recipe".into(),
            content: "flour".into(),
        },
    );

    let mut out = Vec::new();
    run::<Note, _, _>(&registry(&remote), TIMEOUT, true, &mut out)
        .await
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let items = value.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["key"], serde_json::json!(key));
    assert_eq!(items[0]["content"], serde_json::json!("flour"));
    assert!(items[0].get("order").is_none());
}

#[tokio::test]
async fn test_list_empty() {
    let remote = MemoryRemote::new();

    let mut out = Vec::new();
    let snapshot = run::<Note, _, _>(&registry(&remote), TIMEOUT, false, &mut out)
        .await
        .unwrap();

    assert!(snapshot.is_empty());
    assert_eq!(String::from_utf8(out).unwrap(), "No notes.\n");
}

#[tokio::test]
async fn test_ledger_balance() {
    let remote = MemoryRemote::new();
    remote.seed("alice", &entry("salary", 1000.0, LedgerKind::Income));
    remote.seed("alice", &entry("rent", 400.5, LedgerKind::Expense));

    let mut out = Vec::new();
    let snapshot = run::<LedgerEntry, _, _>(&registry(&remote), TIMEOUT, false, &mut out)
        .await
        .unwrap();
    let mut balance = Vec::new();
    write_balance(&snapshot, &mut balance).unwrap();

    assert_eq!(String::from_utf8(balance).unwrap(), "balance: 599.50\n");
}
