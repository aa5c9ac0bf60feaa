// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::document::ServerTimestamp;
use serde_json::json;
use yare::parameterized;

fn test_fields() -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".into(), json!("Buy milk"));
    fields
}

fn test_document() -> Document {
    Document {
        key: "abc123".into(),
        owner_id: "alice".into(),
        fields: test_fields(),
        created_at: ServerTimestamp {
            seconds: 1_700_000_000,
            nanos: 0,
        },
        order: Some(0),
    }
}

#[parameterized(
    subscribe = { ClientMessage::subscribe(1, Collection::Tasks, "alice") },
    unsubscribe = { ClientMessage::unsubscribe(1) },
    create = { ClientMessage::Create { req_id: 2, collection: Collection::Notes, owner_id: "alice".into(), fields: test_fields() } },
    update = { ClientMessage::Update { req_id: 3, collection: Collection::Tasks, owner_id: "alice".into(), key: "k".into(), fields: test_fields() } },
    delete = { ClientMessage::Delete { req_id: 4, collection: Collection::Vault, owner_id: "alice".into(), key: "k".into() } },
    ping = { ClientMessage::ping(12345) },
)]
fn client_message_roundtrip(msg: ClientMessage) {
    let json = msg.to_json().unwrap();
    let parsed = ClientMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn server_message_snapshot_roundtrip() {
    let msg = ServerMessage::snapshot(7, vec![test_document()]);
    let json = msg.to_json().unwrap();
    let parsed = ServerMessage::from_json(&json).unwrap();
    assert_eq!(msg, parsed);
}

#[test]
fn req_id_only_on_writes() {
    assert_eq!(ClientMessage::ping(1).req_id(), None);
    assert_eq!(ClientMessage::subscribe(1, Collection::Notes, "a").req_id(), None);
    let delete = ClientMessage::Delete {
        req_id: 9,
        collection: Collection::Notes,
        owner_id: "a".into(),
        key: "k".into(),
    };
    assert_eq!(delete.req_id(), Some(9));
}

#[parameterized(
    not_found = { Error::NotFound("k".into()), ErrorKind::NotFound },
    forbidden = { Error::Forbidden { key: "k".into() }, ErrorKind::Forbidden },
    corrupted = { Error::CorruptedData("bad".into()), ErrorKind::Internal },
    reserved = { Error::ReservedField("owner_id".into()), ErrorKind::Invalid },
)]
fn error_kind_from_core_error(err: Error, expected: ErrorKind) {
    assert_eq!(ErrorKind::from(&err), expected);
}

#[test]
fn message_json_format() {
    let msg = ClientMessage::subscribe(1, Collection::Tasks, "alice");
    let json = msg.to_json().unwrap();
    assert!(json.contains("\"type\":\"subscribe\""));
    assert!(json.contains("\"collection\":\"tasks\""));

    let msg = ServerMessage::error(None, ErrorKind::Invalid, "test error");
    let json = msg.to_json().unwrap();
    assert!(json.contains("\"type\":\"error\""));
    assert!(json.contains("\"kind\":\"invalid\""));
    assert!(!json.contains("req_id"));

    let msg = ServerMessage::error(Some(5), ErrorKind::NotFound, "gone");
    let json = msg.to_json().unwrap();
    assert!(json.contains("\"req_id\":5"));
    assert!(!json.contains("sub_id"));

    let msg = ServerMessage::subscription_error(3, ErrorKind::Invalid, "no owner");
    let json = msg.to_json().unwrap();
    assert!(json.contains("\"sub_id\":3"));
    assert_eq!(ServerMessage::from_json(&json).unwrap(), msg);
}
