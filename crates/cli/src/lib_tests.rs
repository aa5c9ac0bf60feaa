// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

//! Tests for the public `run()` function.
//!
//! Only paths that finish before connecting are covered here; commands that
//! reach the remote service are tested through `tests/cli.rs`.

use clap::Parser;
use tempfile::TempDir;

use crate::{run, Cli, Config, Error};

/// Port nothing listens on, so any connection attempt fails.
const DEAD_URL: &str = "ws://127.0.0.1:9";

fn cli(temp: &TempDir, args: &[&str]) -> Cli {
    let config = temp.path().join("config.toml");
    let mut argv = vec!["keeper", "--config", config.to_str().unwrap(), "--url", DEAD_URL];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

#[tokio::test]
async fn test_invalid_payload_fails_before_connecting() {
    let temp = TempDir::new().unwrap();

    let err = run(cli(&temp, &["--owner", "alice", "add", "tasks", r#"{"title": ""}"#]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(ref m) if m == "title is required"));
}

#[tokio::test]
async fn test_bad_patch_fails_before_connecting() {
    let temp = TempDir::new().unwrap();

    let err = run(cli(&temp, &["--owner", "alice", "edit", "notes", "k1", r#"{"order": 2}"#]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn test_connection_failure_is_sync_error() {
    let temp = TempDir::new().unwrap();

    let err = run(cli(&temp, &["--owner", "alice", "list", "notes"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), crate::ErrorKind::Sync);
}

#[tokio::test]
async fn test_config_set_owner_then_load() {
    let temp = TempDir::new().unwrap();

    run(cli(&temp, &["config", "set-owner", "carol"])).await.unwrap();

    let config = Config::load(&temp.path().join("config.toml")).unwrap();
    assert_eq!(config.owner.as_deref(), Some("carol"));
}

#[test]
fn test_init_logging_twice() {
    crate::init_logging(false);
    crate::init_logging(true);
}
