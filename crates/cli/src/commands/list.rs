// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::time::Duration;

use kp_core::payload::ledger_balance;
use kp_core::{LedgerEntry, Payload};

use crate::error::Result;
use crate::sync::{RemoteCollections, Snapshot, StoreRegistry};

use super::{open_synced, write_entries, EntryJson};

/// Print the first snapshot of `P`'s collection.
pub async fn run<P: Payload, R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    timeout: Duration,
    json: bool,
    out: &mut W,
) -> Result<Snapshot<P>> {
    let store = open_synced::<P, R>(registry, timeout).await?;
    let snapshot = store.current();

    if json {
        let entries: Vec<EntryJson<'_, P>> = snapshot.iter().map(EntryJson::from).collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_entries(snapshot.entities(), out)?;
    }
    Ok(snapshot)
}

/// Print the signed total of a ledger snapshot.
pub fn write_balance<W: Write>(snapshot: &Snapshot<LedgerEntry>, out: &mut W) -> Result<()> {
    let balance = ledger_balance(snapshot.iter().map(|e| &e.payload));
    writeln!(out, "balance: {:.2}", balance)?;
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
