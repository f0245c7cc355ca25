use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use std::sync::Arc;

use parley_config::ConfigLoader;
use parley_config::schema::ParleyConfig;
use parley_gateway::{GeminiGateway, ModelGateway};

pub mod chat;
pub mod init;
pub mod serve;

/// Parley: conversational data-analysis agent with turn-continuation control
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to parley.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat in the terminal
    Chat {
        /// Disable automatic continuation (the model never speaks twice in a row)
        #[arg(long)]
        no_auto_continue: bool,
    },
    /// Start the HTTP/WebSocket API server
    Serve,
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize a new parley.toml in the current or home directory
    Init {
        /// Create in current directory instead of ~/.parley/
        #[arg(long)]
        local: bool,
    },
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    pub async fn run(self) -> parley_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug".to_string()
        } else if self.quiet {
            "error".to_string()
        } else {
            self.log_level
                .clone()
                .unwrap_or_else(|| config.logging.level.clone())
        };

        // Initialize tracing with the configured format
        if config.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
                )
                .json()
                .with_target(true)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
                )
                .with_target(false)
                .init();
        }

        match self.command {
            Commands::Chat { no_auto_continue } => {
                chat::cmd_chat(config, no_auto_continue).await
            }
            Commands::Serve => serve::cmd_serve(config).await,
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Init { local } => init::cmd_init(local),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    fn cmd_config(config: ParleyConfig, json: bool) -> parley_core::Result<()> {
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&config)
                    .map_err(|e| parley_core::ParleyError::Config(e.to_string()))?
            );
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config)
                    .map_err(|e| parley_core::ParleyError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> parley_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "parley", &mut std::io::stdout());
        Ok(())
    }
}

/// Build the Gemini gateway from config. Warns when no API key is available,
/// since every call will fail without one.
pub(crate) fn build_gateway(config: &ParleyConfig) -> Arc<dyn ModelGateway> {
    let api_key = config.services.gemini_api_key.clone().unwrap_or_default();
    if api_key.is_empty() {
        eprintln!("⚠️  No Gemini API key found. The agent won't be able to respond.");
        eprintln!("   In parley.toml:  [services]");
        eprintln!("                    gemini_api_key = \"...\"");
        eprintln!("   Or env var:      export GEMINI_API_KEY=...");
        eprintln!();
    }

    let mut gateway = GeminiGateway::new(api_key);
    if let Some(ref url) = config.services.gemini_base_url {
        gateway = gateway.with_base_url(url.clone());
    }
    Arc::new(gateway)
}
