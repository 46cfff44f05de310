//! vulnstore CLI
//!
//! Command-line interface for the enrichment store

use clap::{Parser, Subcommand};
use vulnstore_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "vulnstore")]
#[command(about = "vulnstore - Versioned enrichment storage", long_about = None)]
struct Cli {
    /// Logging profile (development, production); logs go to stderr
    #[arg(long, global = true)]
    log: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate(commands::migrate::MigrateArgs),
    /// Ingest a batch of enrichment records as a new run
    Ingest(commands::ingest::IngestArgs),
    /// Query the latest run's enrichments by tag
    Query(commands::query::QueryArgs),
    /// List enrichment runs for an updater
    Runs(commands::runs::RunsArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Some(profile) = cli.log {
        logging_facility::init(profile);
    }

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args),
        Commands::Ingest(args) => commands::ingest::execute(args),
        Commands::Query(args) => commands::query::execute(args),
        Commands::Runs(args) => commands::runs::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
