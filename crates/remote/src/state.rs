// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the canonical document database for shared access and fans out a
//! change notice for every successful write.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use kp_core::{Collection, Database, Document, Fields, Result, ServerTimestamp};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "documents.db";

/// Notice that one owner's documents in a collection changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub collection: Collection,
    pub owner_id: String,
}

/// Shared server state containing the canonical document database.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// The canonical database (protected by mutex for writes).
    db: Mutex<Database>,
    /// Broadcast channel for notifying connections of changes.
    changes_tx: broadcast::Sender<Change>,
}

impl ServerState {
    /// Creates a new server state with the database in the given directory.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let db = Database::open(&data_dir.join(DB_FILE_NAME))?;
        Ok(Self::with_database(db))
    }

    /// Creates a server state around an already opened database.
    pub fn with_database(db: Database) -> Self {
        // Create broadcast channel with reasonable buffer
        let (changes_tx, _) = broadcast::channel(1024);

        ServerState {
            inner: Arc::new(ServerStateInner {
                db: Mutex::new(db),
                changes_tx,
            }),
        }
    }

    /// Creates a document stamped with the current server time.
    pub async fn create(
        &self,
        collection: Collection,
        owner_id: &str,
        fields: Fields,
    ) -> Result<String> {
        let doc = {
            let db = self.inner.db.lock().await;
            db.create_document(collection, owner_id, fields, ServerTimestamp::now())?
        };
        self.notify(collection, owner_id);
        Ok(doc.key)
    }

    /// Merges fields into an existing document.
    pub async fn update(
        &self,
        collection: Collection,
        owner_id: &str,
        key: &str,
        fields: Fields,
    ) -> Result<()> {
        {
            let db = self.inner.db.lock().await;
            db.update_document(collection, owner_id, key, fields)?;
        }
        self.notify(collection, owner_id);
        Ok(())
    }

    /// Deletes a document. Returns false if it did not exist.
    pub async fn delete(&self, collection: Collection, owner_id: &str, key: &str) -> Result<bool> {
        let removed = {
            let db = self.inner.db.lock().await;
            db.delete_document(collection, owner_id, key)?
        };
        if removed {
            self.notify(collection, owner_id);
        }
        Ok(removed)
    }

    /// Returns the current ordered documents of one owner in a collection.
    pub async fn documents(&self, collection: Collection, owner_id: &str) -> Result<Vec<Document>> {
        let db = self.inner.db.lock().await;
        db.list_documents(collection, owner_id)
    }

    /// Subscribe to change notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.inner.changes_tx.subscribe()
    }

    fn notify(&self, collection: Collection, owner_id: &str) {
        // No receivers is fine: nobody is watching
        let _ = self.inner.changes_tx.send(Change {
            collection,
            owner_id: owner_id.to_string(),
        });
    }
}
