// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Object storage for vault uploads.
//!
//! Uploaded bytes are stored content-addressed: the object name is the
//! SHA-256 of its bytes plus the detected extension, so uploading the same
//! file twice yields the same URL.

use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use sha2::{Digest, Sha256};
use tracing::debug;

use kp_core::VaultItem;

use crate::error::{Error, Result};

/// Boxed future returned by object stores.
pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<UploadedObject>> + Send + 'a>>;

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub url: String,
    pub format: String,
    pub size_bytes: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl UploadedObject {
    /// Vault entry describing this object under a display name.
    pub fn into_vault_item(self, name: impl Into<String>) -> VaultItem {
        VaultItem {
            name: name.into(),
            url: self.url,
            format: self.format,
            size_bytes: self.size_bytes,
            width: self.width,
            height: self.height,
        }
    }
}

/// Somewhere uploaded bytes can live.
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` and describe the result. `name` only hints the format.
    fn upload<'a>(&'a self, name: &'a str, bytes: &'a [u8]) -> UploadFuture<'a>;
}

/// Object store in a local directory, addressed by `file://` URLs.
#[derive(Debug, Clone)]
pub struct DirObjectStore {
    root: PathBuf,
}

impl DirObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirObjectStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ObjectStore for DirObjectStore {
    fn upload<'a>(&'a self, name: &'a str, bytes: &'a [u8]) -> UploadFuture<'a> {
        Box::pin(async move {
            if bytes.is_empty() {
                return Err(Error::Upload(format!("{name} is empty")));
            }

            let format = detect_format(name, bytes);
            let digest = hex::encode(Sha256::digest(bytes));
            let path = self.root.join(format!("{digest}.{format}"));

            tokio::fs::create_dir_all(&self.root)
                .await
                .map_err(|e| Error::Upload(format!("{}: {e}", self.root.display())))?;
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!("Object {} already stored", path.display());
            } else {
                tokio::fs::write(&path, bytes)
                    .await
                    .map_err(|e| Error::Upload(format!("{}: {e}", path.display())))?;
                debug!("Stored {} bytes at {}", bytes.len(), path.display());
            }

            let (width, height) = match image_dimensions(bytes) {
                Some((w, h)) => (Some(w), Some(h)),
                None => (None, None),
            };
            Ok(UploadedObject {
                url: format!("file://{}", path.display()),
                format,
                size_bytes: bytes.len() as u64,
                width,
                height,
            })
        })
    }
}

/// Detect a short format name from magic bytes, then the file extension.
pub fn detect_format(name: &str, bytes: &[u8]) -> String {
    if let Some(ext) = image::guess_format(bytes)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
    {
        return ext.to_string();
    }
    if bytes.starts_with(b"%PDF-") {
        return "pdf".to_string();
    }

    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string())
}

/// Pixel dimensions of an encoded image, read from its header.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    reader.format()?;
    match reader.into_dimensions() {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            debug!("No image dimensions: {}", e);
            None
        }
    }
}

#[cfg(test)]
#[path = "objstore_tests.rs"]
mod tests;
