//! Enrichment query command
//!
//! Usage: vulnstore query --updater NAME --tag TAG [--tag TAG ...]
//!
//! Prints one JSON record per line.

use super::{print_stats, StoreArgs};
use clap::Args;

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Updater (data source) name
    #[arg(long)]
    pub updater: String,

    /// Tag to match; records sharing any given tag are returned
    #[arg(long = "tag", required = true)]
    pub tags: Vec<String>,

    /// Print per-phase query stats to stderr
    #[arg(long)]
    pub stats: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: QueryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (store, metrics) = args.store.open(args.stats)?;

    for record in store.get_enrichment(&args.updater, &args.tags)? {
        println!("{}", serde_json::to_string(&record)?);
    }
    if let Some(m) = metrics {
        print_stats(&m);
    }
    Ok(())
}
