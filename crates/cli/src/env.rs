// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Returns the value of `KEEPER_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::KEEPER_CONFIG).map(PathBuf::from)
}

/// Returns the value of `KEEPER_OWNER` if set and not blank.
pub fn owner() -> Option<String> {
    non_empty(vars::KEEPER_OWNER)
}

/// Returns the value of `KEEPER_URL` if set and not blank.
pub fn remote_url() -> Option<String> {
    non_empty(vars::KEEPER_URL)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
