// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::net::SocketAddr;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// A keeper command isolated from the user's config and environment.
pub fn keeper(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("keeper");
    cmd.env("KEEPER_CONFIG", temp.path().join("config.toml"))
        .env_remove("KEEPER_OWNER")
        .env_remove("KEEPER_URL")
        .env_remove("KEEPER_LOG");
    cmd
}

/// A kp-remote server on a random port, running on its own thread.
pub struct RemoteServer {
    pub url: String,
    _data: TempDir,
}

impl RemoteServer {
    pub fn start() -> Self {
        let data = TempDir::new().unwrap();
        let state = kp_remote::ServerState::new(data.path()).unwrap();
        let (addr_tx, addr_rx) = std::sync::mpsc::channel::<SocketAddr>();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
                addr_tx.send(listener.local_addr().unwrap()).unwrap();
                let _ = kp_remote::server::serve(listener, state).await;
            });
        });

        let addr = addr_rx.recv().unwrap();
        RemoteServer {
            url: format!("ws://{addr}"),
            _data: data,
        }
    }

    /// A keeper command signed in as `owner` against this server.
    pub fn keeper(&self, temp: &TempDir, owner: &str) -> Command {
        let mut cmd = keeper(temp);
        cmd.arg("--owner").arg(owner).arg("--url").arg(&self.url);
        cmd
    }
}

/// Run `keeper` and return stdout, asserting success.
pub fn stdout(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

/// Key printed by `add`: "Created <key>  <summary>".
pub fn created_key(out: &str) -> String {
    out.split_whitespace().nth(1).unwrap().to_string()
}
