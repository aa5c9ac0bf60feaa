// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! kp-remote: WebSocket document service for keeper clients.
//!
//! The server owns the canonical documents of every collection and pushes a
//! fresh snapshot to each subscription whose (collection, owner) pair changed.

pub mod server;
pub mod state;

pub use state::{Change, ServerState};
