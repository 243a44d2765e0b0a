//! inkpad CLI
//!
//! One-shot note commands run against the local database; `inkpad shell`
//! keeps the sync engine alive for an interactive session.

mod cli;
mod commands;
mod config;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::common::{open_local_controller, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::shell::run_shell;
use crate::commands::{execute, Interaction};
use crate::config::CliConfig;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "inkpad=info".parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let config = CliConfig::load().map_err(CliError::Config)?;
    let db_path = resolve_db_path(cli.db_path, config.db_path())?;
    tracing::debug!("Using database at {}", db_path.display());

    match cli.command {
        Commands::Note(command) => {
            let mut controller = open_local_controller(&db_path, config.engine)?;
            let result = execute(&mut controller, command, Interaction::Terminal).await;
            controller.flush_snapshot().await?;
            controller.shutdown();
            result?;
        }
        Commands::Shell { memory_remote } => {
            run_shell(&db_path, config.engine, memory_remote).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
