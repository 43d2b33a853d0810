mod cli;
mod commands;
mod output;

use anyhow::{Result, anyhow};
use clap::Parser;

use antecedent_cli::config::loader::load_config;
use antecedent_cli::observability;
use cli::{Cli, Commands};
use output::print_error;

/// Exit code when the resources belong to another release.
const EXIT_FOREIGN_OWNER: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut cfg = load_config(cli.config.as_deref()).map_err(|e| anyhow!(e))?;
    if let Some(server) = &cli.server {
        cfg.connection.server = server.clone();
    }
    let level = cli.log_level.as_deref().unwrap_or(&cfg.logging.level);
    observability::init_tracing_with_level(level);
    tracing::debug!(server = %cfg.connection.server, "Loaded configuration");

    match &cli.command {
        Commands::Decompose(args) => commands::decompose_manifest(args)?,
        Commands::Verify(args) => {
            if !commands::verify(&cfg, args).await? {
                return Ok(EXIT_FOREIGN_OWNER);
            }
        }
        Commands::Claim(args) => commands::claim(&cfg, args).await?,
    }

    Ok(0)
}
