// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! kp-core: Shared library for the keeper personal data manager
//!
//! This crate provides the collection and payload types, the document wire
//! shape, the client/server protocol and the SQLite document database used by
//! both the keeper client and the kp-remote server.

pub mod collection;
pub mod db;
pub mod document;
pub mod error;
pub mod key;
pub mod payload;
pub mod protocol;

pub use collection::Collection;
pub use db::Database;
pub use document::{Document, Entity, Fields, ServerTimestamp};
pub use error::{Error, Result};
pub use payload::{
    Credential, Expense, LedgerEntry, LedgerKind, Note, Payload, Task, VaultItem,
};
