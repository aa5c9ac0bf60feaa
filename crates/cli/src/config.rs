// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User configuration management.
//!
//! Configuration is stored in `config.toml` under the user config directory
//! (or at `$KEEPER_CONFIG`) and includes:
//! - `owner`: the signed-in user id
//! - `objects_dir`: where vault uploads are stored
//! - `[remote]`: the document service URL and timeouts
//!
//! A missing file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};
use crate::sync::SyncConfig;

const APP_DIR_NAME: &str = "keeper";
const CONFIG_FILE_NAME: &str = "config.toml";
const OBJECTS_DIR_NAME: &str = "objects";

/// User configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Owner id used to scope every collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Directory for uploaded objects (default: data dir `keeper/objects`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects_dir: Option<PathBuf>,
    /// Remote document service.
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// Remote document service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// WebSocket URL: `ws://...` or `wss://...`.
    #[serde(default = "default_url")]
    pub url: String,
    /// Max time to wait for the initial connection in seconds (default: 5).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Max time to wait for a write acknowledgement in seconds (default: 10).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Heartbeat ping interval in milliseconds (default: 30000). 0 = disabled.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            url: default_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

fn default_url() -> String {
    "ws://localhost:7890".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

impl RemoteConfig {
    /// Validates that the URL is a WebSocket URL.
    ///
    /// Returns an error message if the URL is invalid.
    pub fn validate_url(&self) -> Option<String> {
        let rest = self
            .url
            .strip_prefix("ws://")
            .or_else(|| self.url.strip_prefix("wss://"));
        match rest {
            Some(host) if !host.is_empty() => None,
            Some(_) => Some(format!("remote URL '{}' has no host", self.url)),
            None => Some(format!(
                "invalid remote URL '{}': must be ws:// or wss://",
                self.url
            )),
        }
    }

    /// Adapter settings for this remote.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            url: self.url.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            heartbeat_interval: match self.heartbeat_interval_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or defaults if the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => {
                return Err(Error::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        if let Some(msg) = config.remote.validate_url() {
            return Err(Error::Config(msg));
        }
        Ok(config)
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the owner: command line, then `KEEPER_OWNER`, then the file.
    pub fn resolve_owner(&self, cli: Option<&str>) -> Option<String> {
        self.resolve_owner_with(cli, env::owner())
    }

    /// Like [`Config::resolve_owner`] with an explicit environment value.
    pub fn resolve_owner_with(&self, cli: Option<&str>, env_owner: Option<String>) -> Option<String> {
        let blank_to_none = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        cli.and_then(blank_to_none)
            .or_else(|| env_owner.as_deref().and_then(blank_to_none))
            .or_else(|| self.owner.as_deref().and_then(blank_to_none))
    }

    /// Directory for uploaded objects.
    pub fn objects_dir(&self) -> Result<PathBuf> {
        match &self.objects_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|d| d.join(APP_DIR_NAME).join(OBJECTS_DIR_NAME))
                .ok_or_else(|| Error::Config("no data directory; set objects_dir".to_string())),
        }
    }
}

/// Path of the config file: `$KEEPER_CONFIG`, else the user config dir.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::config_path() {
        return Ok(path);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("no config directory; set KEEPER_CONFIG".to_string()))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
