// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use kp_core::{Payload, VaultItem};

use crate::error::{Error, Result};
use crate::objstore::ObjectStore;
use crate::sync::{RemoteCollections, StoreRegistry};

/// A local file ready to upload.
#[derive(Debug)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Read `path`, naming it after the file unless `name` is given.
pub async fn read_file(path: &Path, name: Option<String>) -> Result<LocalFile> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Upload(format!("cannot read {}: {}", path.display(), e)))?;
    let name = name
        .or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| path.display().to_string());
    Ok(LocalFile { name, bytes })
}

/// Upload a file and record it as a vault item.
pub async fn run<R: RemoteCollections, S: ObjectStore, W: Write>(
    registry: &StoreRegistry<R>,
    objects: &S,
    file: LocalFile,
    out: &mut W,
) -> Result<()> {
    let store = registry.open::<VaultItem>()?;
    let object = objects.upload(&file.name, &file.bytes).await?;
    let item = object.into_vault_item(file.name);
    let summary = item.summary();

    let key = store.create(item).await?;
    writeln!(out, "Created {}  {}", key, summary)?;
    Ok(())
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
