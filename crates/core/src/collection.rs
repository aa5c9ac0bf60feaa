// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Named per-user collections.
//!
//! Every document lives in exactly one collection. The wire name is what the
//! remote service stores and filters on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the six per-user document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Saved website credentials.
    Credentials,
    /// Free-form notes.
    Notes,
    /// Checklist tasks, kept in a user-chosen order.
    Tasks,
    /// Uploaded files and images.
    Vault,
    /// Expense tracker transactions.
    Expenses,
    /// Income and expense ledger transactions.
    Ledger,
}

impl Collection {
    /// All collections, in display order.
    pub const ALL: [Collection; 6] = [
        Collection::Credentials,
        Collection::Notes,
        Collection::Tasks,
        Collection::Vault,
        Collection::Expenses,
        Collection::Ledger,
    ];

    /// Returns the wire name used in storage and protocol messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Credentials => "credentials",
            Collection::Notes => "notes",
            Collection::Tasks => "tasks",
            Collection::Vault => "vault",
            Collection::Expenses => "expenses",
            Collection::Ledger => "ledger",
        }
    }

    /// Returns true if documents carry an explicit `order` field.
    pub fn is_orderable(&self) -> bool {
        matches!(self, Collection::Tasks)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "credentials" | "passwords" => Ok(Collection::Credentials),
            "notes" => Ok(Collection::Notes),
            "tasks" | "todos" => Ok(Collection::Tasks),
            "vault" => Ok(Collection::Vault),
            "expenses" => Ok(Collection::Expenses),
            "ledger" => Ok(Collection::Ledger),
            _ => Err(Error::UnknownCollection(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
