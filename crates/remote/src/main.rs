// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! kp-remote: WebSocket document server for keeper.
//!
//! This server maintains the canonical documents and pushes live snapshots to
//! every subscribed client.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use kp_remote::{server, state};

/// kp-remote: Live document server for keeper
#[derive(Parser, Debug)]
#[command(name = "kp-remote")]
#[command(about = "WebSocket document server for keeper collections")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for database storage
    #[arg(short, long, default_value = ".")]
    data: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting kp-remote server");
    info!("  Bind address: {}", args.bind);
    info!("  Data directory: {}", args.data.display());

    let state = state::ServerState::new(&args.data)?;

    server::run(args.bind, state).await?;

    Ok(())
}
