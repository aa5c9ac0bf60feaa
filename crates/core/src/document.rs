// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote document records and their decoded local shape.
//!
//! A [`Document`] is what the remote service stores and ships over the wire:
//! an opaque key, the owning user, untyped payload fields, a server-assigned
//! creation timestamp and an optional order rank. An [`Entity`] is the same
//! record with its payload decoded into a typed [`Payload`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::payload::Payload;

/// Untyped payload fields of a document.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Field names owned by the document envelope, never by the payload.
pub const RESERVED_FIELDS: [&str; 3] = ["key", "owner_id", "created_at"];

/// Name of the rank field on orderable collections.
pub const ORDER_FIELD: &str = "order";

/// A timestamp assigned by the remote service at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerTimestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second nanoseconds.
    pub nanos: u32,
}

impl ServerTimestamp {
    /// Current wall clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        ServerTimestamp {
            seconds: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        }
    }

    /// Decodes into a UTC datetime.
    ///
    /// Fails with [`Error::CorruptedData`] if the value is out of range.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>> {
        if self.nanos >= 1_000_000_000 {
            return Err(Error::CorruptedData(format!(
                "timestamp nanos out of range: {}",
                self.nanos
            )));
        }
        DateTime::from_timestamp(self.seconds, self.nanos).ok_or_else(|| {
            Error::CorruptedData(format!("timestamp out of range: {}s", self.seconds))
        })
    }
}

/// A stored document as the remote service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Server-assigned opaque key, unique within the collection.
    pub key: String,
    /// Identity of the owning user.
    pub owner_id: String,
    /// Collection-specific payload fields.
    #[serde(default)]
    pub fields: Fields,
    /// Server-side creation time.
    pub created_at: ServerTimestamp,
    /// Rank within an orderable collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// A document decoded into its local, typed shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity<P> {
    pub key: String,
    pub owner_id: String,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub order: Option<i64>,
}

impl<P: Payload> Entity<P> {
    /// Maps a remote document into the local entity shape.
    pub fn from_document(doc: Document) -> Result<Self> {
        let created_at = doc.created_at.to_datetime()?;
        let payload: P = serde_json::from_value(serde_json::Value::Object(doc.fields))?;
        Ok(Entity {
            key: doc.key,
            owner_id: doc.owner_id,
            payload,
            created_at,
            order: doc.order,
        })
    }
}

/// Checks a partial update against the envelope rules of a collection.
///
/// Reserved envelope fields may never be written. The `order` field is only
/// accepted on orderable collections and must be an integer.
pub fn check_patch(collection: Collection, patch: &Fields) -> Result<()> {
    for name in patch.keys() {
        if RESERVED_FIELDS.contains(&name.as_str()) {
            return Err(Error::ReservedField(name.clone()));
        }
    }

    if let Some(order) = patch.get(ORDER_FIELD) {
        if !collection.is_orderable() {
            return Err(Error::NotOrderable(collection.to_string()));
        }
        if order.as_i64().is_none() {
            return Err(Error::InvalidField {
                field: ORDER_FIELD,
                reason: format!("expected an integer, got {order}"),
            });
        }
    }

    Ok(())
}

/// Builds the partial update that sets only the order rank.
pub fn order_patch(rank: i64) -> Fields {
    let mut patch = Fields::new();
    patch.insert(ORDER_FIELD.to_string(), serde_json::Value::from(rank));
    patch
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
