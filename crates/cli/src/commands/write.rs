// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::time::Duration;

use kp_core::document::check_patch;
use kp_core::{Collection, Fields, Payload};

use crate::error::{Error, Result};
use crate::sync::{RemoteCollections, StoreRegistry};

use super::open_synced;

/// Decode and validate a payload from command line JSON.
pub fn parse_payload<P: Payload>(json: &str) -> Result<P> {
    let payload: P = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("invalid {} fields: {}", P::COLLECTION, e)))?;
    payload.validate()?;
    Ok(payload)
}

/// Decode a partial update and check it against the collection's rules.
pub fn parse_patch(collection: Collection, json: &str) -> Result<Fields> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("invalid fields: {}", e)))?;
    let serde_json::Value::Object(patch) = value else {
        return Err(Error::Validation(
            "fields must be a JSON object".to_string(),
        ));
    };
    if patch.is_empty() {
        return Err(Error::Validation("no fields to change".to_string()));
    }
    check_patch(collection, &patch)?;
    Ok(patch)
}

pub async fn add<P: Payload, R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    payload: P,
    out: &mut W,
) -> Result<()> {
    let store = registry.open::<P>()?;
    let summary = payload.summary();
    let key = store.create(payload).await?;
    writeln!(out, "Created {}  {}", key, summary)?;
    Ok(())
}

/// Merge a patch into an entry once the collection has synced.
pub async fn edit<P: Payload, R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    key: &str,
    patch: Fields,
    timeout: Duration,
    out: &mut W,
) -> Result<()> {
    let store = open_synced::<P, R>(registry, timeout).await?;
    store.update_fields(key, patch).await?;
    writeln!(out, "Updated {}", key)?;
    Ok(())
}

pub async fn remove<P: Payload, R: RemoteCollections, W: Write>(
    registry: &StoreRegistry<R>,
    key: &str,
    out: &mut W,
) -> Result<()> {
    let store = registry.open::<P>()?;
    store.delete(key).await?;
    writeln!(out, "Deleted {}", key)?;
    Ok(())
}

#[cfg(test)]
#[path = "write_tests.rs"]
mod tests;
