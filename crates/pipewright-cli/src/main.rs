//! Pipewright CLI
//!
//! Validates and inspects ETL process configurations. Nothing here executes
//! a pipeline: an invalid configuration is printed in full and rejected, and
//! a valid one is handed to the connector runtime elsewhere.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Pipewright - ETL process configuration tool
#[derive(Parser)]
#[command(name = "pipewright")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "etl.conf")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration without running anything
    Validate,

    /// Show the decoded processes
    Show {
        /// Print the full typed model as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Validate => {
            commands::validate::run(&cli.config)?;
        }
        Commands::Show { json } => {
            commands::show::run(&cli.config, json)?;
        }
    }

    Ok(())
}
