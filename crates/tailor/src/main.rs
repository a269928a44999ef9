//! Tailor CLI - classify catalogue garment images and write copy back to Postgres.
//!
//! # Usage
//!
//! ```bash
//! # Check the database connection and the target table
//! tailor check --schema
//!
//! # Full run with a backup table and JSON audit trail
//! tailor run --table garments --filter "garment_title IS NULL"
//!
//! # Try the classifier on local files without touching the database
//! tailor classify ./samples/ --top-k 5
//!
//! # Manage models
//! tailor models download
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tailor_core::Config;

mod cli;
mod logging;

/// Tailor - garment image classification with catalogue write-back.
#[derive(Parser, Debug)]
#[command(name = "tailor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "TAILOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify catalogue rows and write titles and descriptions back
    Run(cli::run::RunArgs),

    /// Test the database connection
    Check(cli::check::CheckArgs),

    /// Print the columns of a table
    Schema(cli::check::SchemaArgs),

    /// Classify local image files (no database)
    Classify(cli::classify::ClassifyArgs),

    /// Measure accuracy over a labelled image directory
    Evaluate(cli::classify::EvaluateArgs),

    /// Manage the embedding model (download, path)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // An explicit --config must load; the default location falls back to defaults.
    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match Config::load() {
            Ok(config) => config,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to load config: {e}\n  \
                     Using default configuration. Check your config file with `tailor config path`."
                );
                Config::default()
            }
        },
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Tailor v{}", tailor_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Check(args) => cli::check::execute(args, config).await,
        Commands::Schema(args) => cli::check::schema(args, config).await,
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Evaluate(args) => cli::classify::evaluate(args, config).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}
