// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! keeper - a personal data manager over a live document service.
//!
//! This crate provides the sync layer and the `keeper` CLI. Collections
//! (credentials, notes, tasks, vault, expenses, ledger) live in a remote
//! service; keeper holds a live, owner-scoped snapshot of each one.
//!
//! # Main Components
//!
//! - [`SyncStore`] - live snapshot of one collection plus its mutations
//! - [`ReorderableList`] - optimistic drag-to-reorder for tasks
//! - [`StoreRegistry`] - one store per `(collection, owner)`, torn down on sign-out
//! - [`WsRemote`] - WebSocket adapter for the kp-remote server
//! - [`DirObjectStore`] - content-addressed uploads for the vault
//! - [`Error`] - error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use keeper::{StoreRegistry, SyncConfig, WsRemote};
//! use kp_core::Task;
//!
//! let remote = WsRemote::connect(&SyncConfig::default()).await?;
//! let registry = StoreRegistry::new(Arc::new(remote));
//! registry.sign_in("alice")?;
//!
//! let tasks = registry.open::<Task>()?;
//! tasks.create(Task::new("Buy milk")).await?;
//! ```

mod cli;
mod commands;
mod env;

pub mod config;
pub mod error;
pub mod objstore;
pub mod sync;

pub use cli::{Cli, Command, ConfigCommand, GlobalArgs, OutputArgs};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use objstore::{DirObjectStore, ObjectStore, UploadedObject};
pub use sync::{
    Origin, RemoteCollections, RemoteError, ReorderableList, Snapshot, SnapshotStream,
    StoreRegistry, SubscriptionHandle, SyncConfig, SyncStore, WsRemote,
};

use tracing_subscriber::EnvFilter;

/// Install the stderr log subscriber.
///
/// Honors `KEEPER_LOG` (an `EnvFilter` directive); otherwise logs warnings,
/// or debug output when `verbose` is set. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(env::vars::KEEPER_LOG)
        .unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub async fn run(cli: Cli) -> Result<()> {
    commands::run(cli).await
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
