// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use crate::cli::ConfigCommand;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};

use super::Context;

/// Execute a config subcommand.
pub fn run<W: Write>(ctx: &Context, cmd: ConfigCommand, out: &mut W) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx, out),
        ConfigCommand::SetOwner { owner } => {
            let mut config = ctx.config.clone();
            config.owner = Some(owner.trim().to_string());
            config.save(&ctx.config_path)?;
            writeln!(out, "owner = {}", owner.trim())?;
            Ok(())
        }
        ConfigCommand::SetUrl { url } => {
            let remote = RemoteConfig {
                url,
                ..ctx.config.remote.clone()
            };
            if let Some(msg) = remote.validate_url() {
                return Err(Error::Config(msg));
            }
            let mut config = ctx.config.clone();
            config.remote = remote;
            config.save(&ctx.config_path)?;
            writeln!(out, "remote.url = {}", config.remote.url)?;
            Ok(())
        }
    }
}

fn show<W: Write>(ctx: &Context, out: &mut W) -> Result<()> {
    writeln!(out, "config: {}", ctx.config_path.display())?;
    writeln!(out, "owner: {}", ctx.owner.as_deref().unwrap_or("(not set)"))?;
    writeln!(out, "remote.url: {}", ctx.remote.url)?;
    writeln!(
        out,
        "remote.timeouts: connect {}s, request {}s",
        ctx.remote.connect_timeout_secs, ctx.remote.request_timeout_secs
    )?;
    match ctx.config.objects_dir() {
        Ok(dir) => writeln!(out, "objects_dir: {}", dir.display())?,
        Err(_) => writeln!(out, "objects_dir: (not set)")?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
