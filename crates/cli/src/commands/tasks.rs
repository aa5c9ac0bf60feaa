// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Task-only commands: reordering and completion.

use std::io::Write;
use std::time::Duration;

use serde_json::json;

use kp_core::{Payload, Task};

use crate::error::{Error, Result};
use crate::sync::{RemoteCollections, ReorderableList, StoreRegistry};

use super::{open_synced, write_entries};

/// Move the task at `from` to `to` and print the resulting order.
pub async fn reorder<R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    from: usize,
    to: usize,
    timeout: Duration,
    out: &mut W,
) -> Result<()> {
    let store = open_synced::<Task, R>(registry, timeout).await?;
    let len = store.current().len();
    if from >= len || to >= len {
        return Err(Error::Validation(format!(
            "position out of range: {} tasks (0..{})",
            len,
            len.saturating_sub(1)
        )));
    }

    let list = ReorderableList::new(store)?;
    list.reorder(from, to).await?;
    write_entries(list.store().current().entities(), out)?;
    Ok(())
}

/// Flip the done flag of one task.
pub async fn toggle<R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    key: &str,
    timeout: Duration,
    out: &mut W,
) -> Result<()> {
    let store = open_synced::<Task, R>(registry, timeout).await?;
    let mut task = store
        .current()
        .get(key)
        .map(|e| e.payload.clone())
        .ok_or_else(|| Error::NotFound(key.to_string()))?;

    task.done = !task.done;
    store.update(key, json!({ "done": task.done })).await?;
    writeln!(out, "{}", task.summary())?;
    Ok(())
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
