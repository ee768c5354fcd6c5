// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Labelwerk: command-line front end for the label-printer service.
//
// Entry point. Initialises logging, resolves configuration, opens a session,
// and dispatches the subcommand.

mod commands;
mod config_file;

use std::process::ExitCode;

use clap::Parser;
use labelwerk_client::Session;
use labelwerk_core::error::Result;
use labelwerk_core::human_errors::humanize_error;

use commands::Command;
use config_file::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "labelwerk",
    version,
    about = "Queue, tune and print labels on a label-printer service"
)]
struct Cli {
    /// Label server origin, e.g. http://localhost:3000
    #[arg(long, global = true)]
    url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            let human = humanize_error(&e);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let dir = config_file::config_dir();
    let overrides = Overrides {
        env_url: std::env::var(config_file::URL_ENV).ok(),
        flag_url: cli.url,
        flag_timeout: cli.timeout,
    };
    let config = config_file::resolve(&dir, overrides)?;

    if let Command::Config { save } = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        if save {
            let path = config_file::persist_config(&dir, &config)?;
            println!("saved to {}", path.display());
        }
        return Ok(());
    }

    tracing::debug!(base = %config.base_url, "connecting");
    let session = Session::connect(&config)?;
    commands::run(cli.command, &session).await
}
