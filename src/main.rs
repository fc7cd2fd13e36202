mod cli;
mod commands;
mod error;
mod logging;

use crate::cli::Cli;
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use std::process;
use unref_config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    if let Err(error) = run(cli).await {
        tracing::error!(error = ?error, "Command failed");
        eprintln!("Error: {error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(project) = cli.project {
        config.project_root = Some(project);
    }
    tracing::debug!(config = ?config, "Configuration loaded");
    commands::run(cli.command, config).await
}
