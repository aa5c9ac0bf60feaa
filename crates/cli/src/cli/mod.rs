// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use kp_core::Collection;

pub use args::{GlobalArgs, OutputArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a collection name or alias.
fn parse_collection(s: &str) -> Result<Collection, String> {
    Collection::from_str(s).map_err(|_| {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown collection '{}' (expected one of: {})", s, names.join(", "))
    })
}

const COMMANDS_HELP: &str = "\
Collections: credentials, notes, tasks, vault, expenses, ledger

Reading:
  list        Print a collection
  watch       Print every snapshot as it arrives

Writing:
  add         Create an entry from JSON fields
  edit        Merge JSON fields into an entry
  rm          Delete an entry
  move        Reorder tasks
  toggle      Flip a task's done flag
  upload      Upload a file into the vault

Setup:
  config      Show or change configuration";

const QUICKSTART_HELP: &str = "\
Get started:
  keeper config set-owner alice
  keeper add tasks '{\"title\": \"Buy milk\"}'
  keeper list tasks
  keeper move 2 0";

#[derive(Parser)]
#[command(name = "keeper", version)]
#[command(about = "Personal data manager backed by a live document service")]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print a collection
    List {
        /// Collection to print
        #[arg(value_parser = parse_collection)]
        collection: Collection,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print every snapshot of a collection as it arrives
    Watch {
        /// Collection to watch
        #[arg(value_parser = parse_collection)]
        collection: Collection,

        /// Stop after this many snapshots
        #[arg(long, short = 'n')]
        count: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Create an entry from a JSON object of fields
    Add {
        #[arg(value_parser = parse_collection)]
        collection: Collection,

        /// Fields, e.g. '{"title": "Buy milk"}'
        fields: String,
    },

    /// Merge a JSON object of fields into an entry
    Edit {
        #[arg(value_parser = parse_collection)]
        collection: Collection,

        /// Entry key
        key: String,

        /// Fields to change, e.g. '{"done": true}'
        fields: String,
    },

    /// Delete an entry
    #[command(alias = "remove")]
    Rm {
        #[arg(value_parser = parse_collection)]
        collection: Collection,

        /// Entry key
        key: String,
    },

    /// Move the task at one position to another (0-based)
    Move {
        from: usize,
        to: usize,
    },

    /// Flip a task's done flag
    Toggle {
        /// Task key
        key: String,
    },

    /// Upload a file and add it to the vault
    Upload {
        /// File to upload
        path: PathBuf,

        /// Display name (default: file name)
        #[arg(long, value_parser = non_empty_string)]
        name: Option<String>,
    },

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved configuration
    Show,

    /// Set the owner id
    SetOwner {
        #[arg(value_parser = non_empty_string)]
        owner: String,
    },

    /// Set the remote service URL
    SetUrl {
        url: String,
    },
}

impl Command {
    /// Short name of the action, for error notifications.
    pub fn action(&self) -> &'static str {
        match self {
            Command::List { .. } => "list",
            Command::Watch { .. } => "watch",
            Command::Add { .. } => "add",
            Command::Edit { .. } => "edit",
            Command::Rm { .. } => "delete",
            Command::Move { .. } => "move",
            Command::Toggle { .. } => "toggle",
            Command::Upload { .. } => "upload",
            Command::Config(_) => "config",
        }
    }
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
