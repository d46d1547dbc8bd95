//! RelayClaw CLI: the main entry point.
//!
//! Commands:
//! - `run`      Start every enabled channel and relay outbound messages
//! - `status`   Show which channels the current config enables
//! - `resolve`  Show how a model id is routed with the current credentials

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relayclaw_core::provider::DEFAULT_TEMPERATURE;

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "relayclaw",
    about = "RelayClaw: chat channel relay and LLM routing",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at INFO level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    debug: bool,

    /// Also write a daily-rotated DEBUG log to this file
    #[arg(long, global = true, env = "RELAYCLAW_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Config file (defaults to ~/.relayclaw/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start all enabled channels (SIGHUP reloads config, Ctrl-C stops)
    Run,

    /// Print channel status as JSON
    Status,

    /// Resolve a model id against the configured provider
    Resolve {
        /// Model to resolve (defaults to the configured default model)
        #[arg(short, long)]
        model: Option<String>,

        /// Requested sampling temperature
        #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())
        .map_err(|e| format!("Failed to load config: {e}"))?;

    let log_file = cli.log_file.clone().or_else(|| config.logging.file.clone());
    let _log_guard = logging::init(
        logging::console_level(cli.verbose, cli.debug),
        log_file.as_deref(),
    );

    match cli.command {
        Commands::Run => commands::run::run(config, cli.config).await?,
        Commands::Status => commands::status::run(&config)?,
        Commands::Resolve { model, temperature } => {
            commands::resolve::run(&config, model.as_deref(), temperature)?
        }
    }

    Ok(())
}
