//! taskrelay CLI: the main entry point.
//!
//! Commands:
//! - `chat`: talk to the orchestrator, interactively or one message at a time
//! - `invoke`: call a capability directly and print its envelope
//! - `capabilities`: list registered capabilities and their schemas
//! - `audit`: read back the JSONL audit trail
//! - `config`: show, locate, or validate configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use taskrelay_config::{AppConfig, ConfigError, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "taskrelay",
    about = "taskrelay: capability dispatch for task management",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.taskrelay/config.toml
    #[arg(long, global = true, env = "TASKRELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the orchestrator
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Caller identity passed to capabilities
        #[arg(short, long, env = "TASKRELAY_USER", default_value = "local")]
        user: String,
    },

    /// Invoke a capability directly
    Invoke {
        /// Capability name, e.g. add_task
        capability: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Caller identity
        #[arg(short, long, env = "TASKRELAY_USER", default_value = "local")]
        user: String,

        /// Override the configured timeout
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// List registered capabilities
    Capabilities {
        /// Print the full listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recorded invocations
    Audit {
        /// Only this caller
        #[arg(short, long)]
        user: Option<String>,

        /// Only this capability
        #[arg(short, long)]
        capability: Option<String>,

        /// Only records at or after this RFC 3339 timestamp
        #[arg(long)]
        since: Option<String>,

        /// Print raw JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config_cmd::ConfigAction,
    },
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if logging.format == "json" {
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

fn require(loaded: Result<AppConfig, ConfigError>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    loaded.map_err(|e| format!("Failed to load config: {e}").into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let loaded = AppConfig::load_file(&config_path);

    let logging = loaded.as_ref().map(|c| c.logging.clone()).unwrap_or_default();
    init_tracing(&logging, cli.verbose);

    match cli.command {
        Commands::Chat { message, user } => {
            commands::chat::run(require(loaded)?, message, user).await?
        }
        Commands::Invoke {
            capability,
            params,
            user,
            timeout_ms,
        } => commands::invoke::run(require(loaded)?, capability, params, user, timeout_ms).await?,
        Commands::Capabilities { json } => commands::capabilities::run(require(loaded)?, json).await?,
        Commands::Audit {
            user,
            capability,
            since,
            json,
        } => commands::audit::run(require(loaded)?, user, capability, since, json).await?,
        Commands::Config { action } => commands::config_cmd::run(action, &config_path, loaded).await?,
    }

    Ok(())
}
