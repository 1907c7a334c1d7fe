//! LedgerLoop CLI, the main entry point.
//!
//! Commands:
//! - `run`     Drive the executor with a scripted planner
//! - `config`  Show, validate or locate the configuration

use clap::{Parser, Subcommand};
use ledgerloop_config::AppConfig;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ledgerloop",
    about = "LedgerLoop: a plan-act-observe agent executor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.ledgerloop/config.toml
    #[arg(long, global = true, env = "LEDGERLOOP_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the executor against a planner script
    Run(commands::run::RunArgs),

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the configuration
    Validate,
    /// Print the default config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    let config = config.map_err(|e| format!("Failed to load config: {e}"))?;

    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Run(args) => commands::run::run(&config, args).await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show) {
            ConfigAction::Show => commands::config_cmd::show(&config)?,
            ConfigAction::Validate => commands::config_cmd::validate(&config)?,
            ConfigAction::Path => commands::config_cmd::path(cli.config.as_deref()),
        },
    }

    Ok(())
}

fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Logs go to stderr so stdout stays parseable.
    if config.logging.is_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}
