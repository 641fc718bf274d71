//! savvylinks CLI
//!
//! Command-line front end for savvylinks: search, copy, open and toggle
//! SavvyCal scheduling links.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use savvylinks_core::{Config, LinkAction, LinksEngine};

mod commands;
mod host;
mod output;

use host::CliHost;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "savvylinks")]
#[command(about = "savvylinks - Search and manage SavvyCal scheduling links")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file (overrides SAVVYLINKS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List links, optionally filtered by a fuzzy search
    #[command(alias = "ls")]
    List {
        /// Search text (matches name or private name)
        query: Option<String>,
    },
    /// Show the actions available for a link
    Show {
        /// Link ID
        id: String,
    },
    /// Copy a link's booking URL to the clipboard
    Copy {
        /// Link ID
        id: String,
    },
    /// Open a link's booking page in the browser
    Open {
        /// Link ID
        id: String,
    },
    /// Toggle a link between enabled and disabled
    Toggle {
        /// Link ID
        id: String,
    },
    /// Keep links refreshed in the background and search interactively
    Watch,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (token, api_url, refresh_interval_secs, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands don't need the engine
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let host = Arc::new(CliHost::new(output));
    let engine = LinksEngine::new(&config, host)?;

    match cli.command {
        None | Some(Commands::Watch) => commands::watch::run(engine, &output).await,
        Some(Commands::List { query }) => commands::link::list(&engine, query, &output).await,
        Some(Commands::Show { id }) => commands::link::show(&engine, id, &output).await,
        Some(Commands::Copy { id }) => {
            commands::link::run_action(&engine, id, LinkAction::CopyLink).await
        }
        Some(Commands::Open { id }) => {
            commands::link::run_action(&engine, id, LinkAction::OpenLink).await
        }
        Some(Commands::Toggle { id }) => {
            commands::link::run_action(&engine, id, LinkAction::ToggleAvailability).await
        }
        Some(Commands::Config { .. }) => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if SAVVYLINKS_LOG environment variable is set.
/// Logs to config.log_file when set, otherwise to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("SAVVYLINKS_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "savvylinks_core={},savvylinks_cli={}",
        log_level, log_level
    ));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
