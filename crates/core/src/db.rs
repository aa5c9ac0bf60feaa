// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed document storage for the remote collection service.
//!
//! The [`Database`] struct stores every collection in one table, keyed by
//! (collection, key) and filtered by owner.

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::collection::Collection;
use crate::document::{check_patch, Document, Fields, ServerTimestamp, ORDER_FIELD};
use crate::error::{Error, Result};
use crate::key::generate_unique_key;
use crate::payload::check_fields;

/// SQL schema for the document database.
pub const SCHEMA: &str = r#"
-- Every document of every collection
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    key TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    fields TEXT NOT NULL,        -- JSON object of payload fields
    created_seconds INTEGER NOT NULL,
    created_nanos INTEGER NOT NULL,
    ord INTEGER,                 -- rank, orderable collections only
    PRIMARY KEY (collection, key)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(collection, owner_id);
"#;

const SELECT_COLUMNS: &str =
    "key, owner_id, fields, created_seconds, created_nanos, ord FROM documents";

/// Parse the JSON fields column, returning a rusqlite error on parse failure.
fn parse_fields(value: &str) -> std::result::Result<Fields, rusqlite::Error> {
    serde_json::from_str(value).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid fields object '{value}'"
            ))),
        )
    })
}

fn row_to_document(row: &Row<'_>) -> std::result::Result<Document, rusqlite::Error> {
    let fields: String = row.get(2)?;
    Ok(Document {
        key: row.get(0)?,
        owner_id: row.get(1)?,
        fields: parse_fields(&fields)?,
        created_at: ServerTimestamp {
            seconds: row.get(3)?,
            nanos: row.get(4)?,
        },
        order: row.get(5)?,
    })
}

/// Run schema creation on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Splits the rank out of a field set, leaving only payload fields.
fn take_order(fields: &mut Fields) -> Option<i64> {
    fields.remove(ORDER_FIELD).and_then(|v| v.as_i64())
}

/// SQLite database connection with document operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Database {
    /// Open a database connection at the given path, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Check whether a key exists in a collection.
    pub fn document_exists(&self, collection: Collection, key: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection.as_str(), key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a document by key, regardless of owner.
    pub fn get_document(&self, collection: Collection, key: &str) -> Result<Option<Document>> {
        let sql = format!("SELECT {SELECT_COLUMNS} WHERE collection = ?1 AND key = ?2");
        let doc = self
            .conn
            .query_row(&sql, params![collection.as_str(), key], row_to_document)
            .optional()?;
        Ok(doc)
    }

    /// Create a document and return it as stored.
    ///
    /// Orderable collections without an explicit `order` are appended after
    /// the owner's current last rank.
    pub fn create_document(
        &self,
        collection: Collection,
        owner_id: &str,
        mut fields: Fields,
        created_at: ServerTimestamp,
    ) -> Result<Document> {
        if owner_id.trim().is_empty() {
            return Err(Error::FieldRequired { field: "owner_id" });
        }
        check_patch(collection, &fields)?;

        let order = match take_order(&mut fields) {
            Some(rank) => Some(rank),
            None if collection.is_orderable() => Some(self.next_rank(collection, owner_id)?),
            None => None,
        };

        let key = generate_unique_key(collection, owner_id, &created_at, |k| {
            self.document_exists(collection, k)
        })?;

        self.conn.execute(
            "INSERT INTO documents (collection, key, owner_id, fields,
             created_seconds, created_nanos, ord)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                collection.as_str(),
                key,
                owner_id,
                serde_json::to_string(&fields)?,
                created_at.seconds,
                created_at.nanos,
                order,
            ],
        )?;

        Ok(Document {
            key,
            owner_id: owner_id.to_string(),
            fields,
            created_at,
            order,
        })
    }

    /// Merge top-level fields into an existing document.
    pub fn update_document(
        &self,
        collection: Collection,
        owner_id: &str,
        key: &str,
        mut patch: Fields,
    ) -> Result<()> {
        check_patch(collection, &patch)?;

        let existing = self
            .get_document(collection, key)?
            .ok_or_else(|| Error::NotFound(key.to_string()))?;
        if existing.owner_id != owner_id {
            return Err(Error::Forbidden {
                key: key.to_string(),
            });
        }

        let order = take_order(&mut patch).or(existing.order);
        let mut fields = existing.fields;
        for (name, value) in patch {
            fields.insert(name, value);
        }
        check_fields(collection, &fields)?;

        self.conn.execute(
            "UPDATE documents SET fields = ?1, ord = ?2 WHERE collection = ?3 AND key = ?4",
            params![
                serde_json::to_string(&fields)?,
                order,
                collection.as_str(),
                key
            ],
        )?;
        Ok(())
    }

    /// Delete a document.
    ///
    /// Returns false if the key did not exist; deleting a missing key is not
    /// an error.
    pub fn delete_document(&self, collection: Collection, owner_id: &str, key: &str) -> Result<bool> {
        let Some(existing) = self.get_document(collection, key)? else {
            return Ok(false);
        };
        if existing.owner_id != owner_id {
            return Err(Error::Forbidden {
                key: key.to_string(),
            });
        }

        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND key = ?2",
            params![collection.as_str(), key],
        )?;
        Ok(true)
    }

    /// List one owner's documents in a collection.
    ///
    /// Ordered by rank (unranked last), then creation time, then key.
    pub fn list_documents(&self, collection: Collection, owner_id: &str) -> Result<Vec<Document>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS}
             WHERE collection = ?1 AND owner_id = ?2
             ORDER BY ord IS NULL, ord, created_seconds, created_nanos, key"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let docs = stmt
            .query_map(params![collection.as_str(), owner_id], row_to_document)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(docs)
    }

    /// Rank one past the owner's current highest rank.
    fn next_rank(&self, collection: Collection, owner_id: &str) -> Result<i64> {
        let next: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(ord) + 1, 0) FROM documents
             WHERE collection = ?1 AND owner_id = ?2",
            params![collection.as_str(), owner_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
