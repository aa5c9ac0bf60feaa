// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use keeper::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    keeper::init_logging(cli.global.verbose);

    let action = cli.command.action();
    if let Err(e) = keeper::run(cli).await {
        eprintln!("error: {}", e.notification(action));
        // Hints follow the first line
        for line in e.to_string().lines().skip(1) {
            eprintln!("{}", line);
        }
        std::process::exit(1);
    }
}
