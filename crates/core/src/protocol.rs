// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is simple:
//! - Client subscribes to (collection, owner) pairs and sends writes
//! - Server pushes the full document list of a subscription after every change
//! - Every write carries a request id that the server echoes in its reply

use serde::{Deserialize, Serialize};

use crate::collection::Collection;
use crate::document::{Document, Fields};
use crate::error::Error;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start receiving snapshots of one owner's documents in a collection.
    ///
    /// The server answers with an immediate snapshot.
    Subscribe {
        /// Client-chosen id echoed in every snapshot.
        sub_id: u64,
        collection: Collection,
        owner_id: String,
    },

    /// Stop a subscription. Unknown ids are ignored.
    Unsubscribe { sub_id: u64 },

    /// Create a document. Answered with `Created`.
    Create {
        req_id: u64,
        collection: Collection,
        owner_id: String,
        fields: Fields,
    },

    /// Merge fields into an existing document. Answered with `Ack`.
    Update {
        req_id: u64,
        collection: Collection,
        owner_id: String,
        key: String,
        fields: Fields,
    },

    /// Delete a document. Deleting a missing key is acknowledged.
    Delete {
        req_id: u64,
        collection: Collection,
        owner_id: String,
        key: String,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Coarse classification of a server-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The key does not exist.
    NotFound,
    /// The request was malformed or failed validation.
    Invalid,
    /// The document belongs to another owner.
    Forbidden,
    /// Storage or other server failure.
    Internal,
}

impl From<&Error> for ErrorKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Forbidden { .. } => ErrorKind::Forbidden,
            Error::Database(_) | Error::Io(_) | Error::CorruptedData(_) => ErrorKind::Internal,
            _ => ErrorKind::Invalid,
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full, ordered document list of a subscription.
    Snapshot {
        sub_id: u64,
        documents: Vec<Document>,
    },

    /// Response to `Create`.
    Created { req_id: u64, key: String },

    /// Response to `Update` and `Delete`.
    Ack { req_id: u64 },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error message.
    Error {
        /// Request that failed, if the message could be parsed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        req_id: Option<u64>,
        /// Subscription that was refused; its feed receives nothing further.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sub_id: Option<u64>,
        kind: ErrorKind,
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Subscribe message.
    pub fn subscribe(sub_id: u64, collection: Collection, owner_id: impl Into<String>) -> Self {
        ClientMessage::Subscribe {
            sub_id,
            collection,
            owner_id: owner_id.into(),
        }
    }

    /// Creates an Unsubscribe message.
    pub fn unsubscribe(sub_id: u64) -> Self {
        ClientMessage::Unsubscribe { sub_id }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Request id of a write message, if any.
    pub fn req_id(&self) -> Option<u64> {
        match self {
            ClientMessage::Create { req_id, .. }
            | ClientMessage::Update { req_id, .. }
            | ClientMessage::Delete { req_id, .. } => Some(*req_id),
            _ => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a Snapshot message.
    pub fn snapshot(sub_id: u64, documents: Vec<Document>) -> Self {
        ServerMessage::Snapshot { sub_id, documents }
    }

    /// Creates a Created message.
    pub fn created(req_id: u64, key: impl Into<String>) -> Self {
        ServerMessage::Created {
            req_id,
            key: key.into(),
        }
    }

    /// Creates an Ack message.
    pub fn ack(req_id: u64) -> Self {
        ServerMessage::Ack { req_id }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(req_id: Option<u64>, kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            req_id,
            sub_id: None,
            kind,
            message: message.into(),
        }
    }

    /// Creates an Error message refusing a subscription.
    pub fn subscription_error(sub_id: u64, kind: ErrorKind, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            req_id: None,
            sub_id: Some(sub_id),
            kind,
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
