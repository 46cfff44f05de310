//! Enrichment ingestion command
//!
//! Usage: vulnstore ingest --updater NAME --fingerprint FP [FILE]
//!
//! Input is JSON Lines, one record per line:
//! `{"tags": ["CVE-2024-0001", "os:rhel"], "enrichment": {...}}`.
//! Without FILE (or with `-`) records are read from stdin.

use super::{print_stats, StoreArgs};
use clap::Args;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use vulnstore_core::{EnrichmentRecord, Fingerprint};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Updater (data source) name
    #[arg(long)]
    pub updater: String,

    /// Upstream data version the batch was built from
    #[arg(long, default_value = "")]
    pub fingerprint: String,

    /// JSON Lines file of records; `-` or absent reads stdin
    pub input: Option<PathBuf>,

    /// Print per-phase query stats to stderr
    #[arg(long)]
    pub stats: bool,

    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn execute(args: IngestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn Read> = match &args.input {
        Some(path) if path.as_os_str() != "-" => Box::new(std::fs::File::open(path)?),
        _ => Box::new(std::io::stdin()),
    };
    let records = read_records(reader)?;
    tracing::debug!(updater = %args.updater, records = records.len(), "Read ingest input");

    let (store, metrics) = args.store.open(args.stats)?;
    let run_ref = store.update_enrichments(
        &args.updater,
        &Fingerprint::new(args.fingerprint),
        &records,
    )?;

    println!("{}", run_ref);
    if let Some(m) = metrics {
        print_stats(&m);
    }
    Ok(())
}

/// Parse JSON Lines; blank lines are skipped.
fn read_records(reader: impl Read) -> Result<Vec<EnrichmentRecord>, Box<dyn std::error::Error>> {
    let mut records = Vec::new();
    for (n, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: EnrichmentRecord = serde_json::from_str(&line)
            .map_err(|e| format!("line {}: invalid record: {}", n + 1, e))?;
        records.push(record);
    }
    Ok(records)
}
