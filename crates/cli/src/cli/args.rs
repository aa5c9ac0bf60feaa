// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared argument structs for CLI commands.

use std::path::PathBuf;

use clap::Args;

/// Options accepted by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Owner id to act as (overrides KEEPER_OWNER and config)
    #[arg(long, global = true, value_parser = super::non_empty_string)]
    pub owner: Option<String>,

    /// Path to config.toml (overrides KEEPER_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Remote service URL (overrides KEEPER_URL and config)
    #[arg(long, global = true)]
    pub url: Option<String>,
}

/// Output format arguments.
#[derive(Args, Clone, Debug, Default)]
pub struct OutputArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}
