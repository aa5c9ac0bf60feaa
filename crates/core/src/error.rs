// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for kp-core operations.

use thiserror::Error;

/// All possible errors that can occur in kp-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{field} is required")]
    FieldRequired { field: &'static str },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("unknown collection: '{0}'\n  hint: valid collections are: credentials, notes, tasks, vault, expenses, ledger")]
    UnknownCollection(String),

    #[error("invalid ledger kind: '{0}'\n  hint: valid kinds are: income, expense")]
    InvalidLedgerKind(String),

    #[error("field '{0}' is reserved and cannot be written")]
    ReservedField(String),

    #[error("collection '{0}' is not orderable")]
    NotOrderable(String),

    #[error("invalid {collection} document: {reason}")]
    InvalidDocument { collection: String, reason: String },

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("document {key} belongs to another owner")]
    Forbidden { key: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

impl Error {
    /// Returns true if the error is a local validation failure.
    ///
    /// Validation failures are raised before any storage or network access.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::FieldRequired { .. }
                | Error::InvalidField { .. }
                | Error::InvalidLedgerKind(_)
                | Error::ReservedField(_)
                | Error::NotOrderable(_)
                | Error::InvalidDocument { .. }
        )
    }
}

/// A specialized Result type for kp-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
