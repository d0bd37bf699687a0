//! shellsmith CLI — the main entry point.
//!
//! Commands:
//! - `agent`    — Ask questions interactively or send a single message
//! - `onboard`  — Write the default config file
//! - `doctor`   — Diagnose configuration and provider connectivity

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "shellsmith",
    about = "shellsmith — a terminal agent that builds static websites with shell commands",
    version
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
    /// Chat with the agent
    Agent {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Directory commands run in (defaults to the current directory)
        #[arg(short, long, env = "SHELLSMITH_WORKDIR")]
        workdir: Option<PathBuf>,
    },

    /// Write the default configuration file
    Onboard,

    /// Diagnose configuration and provider connectivity
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = log_filter(cli.verbose);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Agent { message, workdir } => commands::agent::run(message, workdir).await?,
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

/// Default level when `RUST_LOG` is unset.
fn log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}
