// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque document key generation.

use sha2::{Digest, Sha256};

use crate::collection::Collection;
use crate::document::ServerTimestamp;
use crate::error::Result;

/// Generate a document key from the collection, owner and creation time.
/// Format: 20 hex chars of SHA256(collection + owner + seconds + nanos + salt).
pub fn generate_key(
    collection: Collection,
    owner_id: &str,
    created_at: &ServerTimestamp,
    salt: u64,
) -> String {
    let input = format!(
        "{}\0{}\0{}.{:09}\0{}",
        collection, owner_id, created_at.seconds, created_at.nanos, salt
    );
    let hash = Sha256::digest(input.as_bytes());
    hex::encode(&hash[..10])
}

/// Generate a key that does not collide with an existing one.
///
/// The salt is bumped until `exists` reports a free key.
pub fn generate_unique_key<F>(
    collection: Collection,
    owner_id: &str,
    created_at: &ServerTimestamp,
    mut exists: F,
) -> Result<String>
where
    F: FnMut(&str) -> Result<bool>,
{
    let mut salt = 0;
    loop {
        let key = generate_key(collection, owner_id, created_at, salt);
        if !exists(&key)? {
            return Ok(key);
        }
        salt += 1;
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
