// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::RemoteError;

/// All possible errors that can occur in the keeper library.
///
/// Every variant maps onto one coarse [`ErrorKind`] for transient display.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("not signed in\n  hint: pass --owner, set KEEPER_OWNER, or add 'owner' to config.toml")]
    Unauthenticated,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("sync error: {0}")]
    Sync(String),

    #[error("new order not saved: {failed} of {total} updates failed")]
    ReorderFailed { failed: usize, total: usize },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(kp_core::Error),
}

/// Coarse error classes surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A local precondition failed; nothing was sent.
    Validation,
    /// No owner context.
    Unauthenticated,
    /// The remote service does not know the key.
    NotFound,
    /// The object store rejected the payload.
    Upload,
    /// Any other remote or local failure.
    Sync,
}

impl Error {
    /// The coarse class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) | Error::Config(_) => ErrorKind::Validation,
            Error::Unauthenticated => ErrorKind::Unauthenticated,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Upload(_) => ErrorKind::Upload,
            Error::Sync(_)
            | Error::ReorderFailed { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::Core(_) => ErrorKind::Sync,
        }
    }

    /// One-line notification naming the action that failed.
    pub fn notification(&self, action: &str) -> String {
        let detail = self.to_string();
        let first_line = detail.lines().next().unwrap_or_default();
        format!("{action} failed: {first_line}")
    }
}

impl From<kp_core::Error> for Error {
    fn from(err: kp_core::Error) -> Self {
        if err.is_validation() {
            return Error::Validation(err.to_string());
        }
        match err {
            kp_core::Error::NotFound(key) => Error::NotFound(key),
            kp_core::Error::UnknownCollection(_) => Error::Validation(err.to_string()),
            other => Error::Core(other),
        }
    }
}

impl From<RemoteError> for Error {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound(key) => Error::NotFound(key),
            other => Error::Sync(other.to_string()),
        }
    }
}

/// A specialized Result type for keeper operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
