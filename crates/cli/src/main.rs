//! ReactLoop CLI: the main entry point.
//!
//! Commands:
//! - `run`     Replay a scripted model through the ReAct loop
//! - `config`  Show, locate, or validate the configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod builtin_tools;
mod commands;
mod replay;

#[derive(Parser)]
#[command(
    name = "reactloop",
    about = "ReactLoop: a Thought → Action → Observation reasoning engine",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the loop for one message against a scripted model
    Run {
        /// The user message
        message: String,

        /// JSON file holding the model responses to replay, in order
        #[arg(short, long)]
        script: PathBuf,

        /// Override the iteration cap for this run
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Stream the replayed responses chunk by chunk
        #[arg(long)]
        stream: bool,

        /// Print lifecycle events as JSON lines instead of a transcript
        #[arg(long)]
        events: bool,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            message,
            script,
            max_iterations,
            stream,
            events,
            json,
        } => {
            let options = commands::run::RunOptions {
                script,
                max_iterations,
                stream,
                verbose: cli.verbose,
                events,
                json,
            };
            commands::run::run(&message, options).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
