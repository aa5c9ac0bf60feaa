// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live synchronization with the remote document service.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐     ┌─────────────┐     ┌─────────────┐     ┌──────────┐
//! │ StoreRegistry │────►│  SyncStore  │────►│   Remote    │────►│ kp-remote│
//! │ (collection,  │     │  (snapshot) │◄────│   (trait)   │◄────│  server  │
//! │    owner)     │     └─────────────┘     └─────────────┘     └──────────┘
//! └───────────────┘            ▲
//!                              │
//!                     ┌─────────────────┐
//!                     │ ReorderableList │  (optimistic overlay)
//!                     └─────────────────┘
//! ```
//!
//! # Features
//!
//! - Snapshots are replaced wholesale, never patched
//! - Writes are confirmed by the next pushed snapshot
//! - Drag-to-reorder with an optimistic local list
//! - Injectable remote trait for testing

mod registry;
mod remote;
mod reorder;
mod store;
mod transport;

pub use registry::StoreRegistry;
pub use remote::{RemoteCollections, RemoteError, RemoteFeed, RemoteFuture, RemoteResult};
pub use reorder::{array_move, ReorderableList};
pub use store::{Origin, Snapshot, SnapshotStream, SubscriptionHandle, SyncStore};
pub use transport::{SyncConfig, WsRemote};

#[cfg(test)]
pub(crate) mod test_helpers;
