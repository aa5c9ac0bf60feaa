// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use futures_util::StreamExt;
use tracing::info;

use kp_core::Payload;

use crate::error::{Error, Result};
use crate::sync::{RemoteCollections, StoreRegistry};

use super::{write_entries, EntryJson};

/// Print snapshots of `P`'s collection as they arrive.
///
/// Stops after `count` snapshots, on Ctrl-C, or when the subscription ends.
pub async fn run<P: Payload, R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    count: Option<usize>,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let (_store, stream) = registry.open_with_stream::<P>()?;
    let mut stream = stream.ok_or_else(|| {
        Error::Sync(format!("{} is already being watched", P::COLLECTION))
    })?;

    let mut seen = 0usize;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while count.map_or(true, |max| seen < max) {
        let snapshot = tokio::select! {
            next = stream.next() => match next {
                Some(snapshot) => snapshot,
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("Interrupted");
                break;
            }
        };
        seen += 1;

        if json {
            let entries: Vec<EntryJson<'_, P>> = snapshot.iter().map(EntryJson::from).collect();
            writeln!(out, "{}", serde_json::to_string(&entries)?)?;
        } else {
            writeln!(out, "-- {} ({}) --", P::COLLECTION, snapshot.len())?;
            write_entries(snapshot.entities(), out)?;
        }
        out.flush()?;
    }
    Ok(())
}
