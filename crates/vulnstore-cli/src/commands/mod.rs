//! Subcommand implementations

pub mod ingest;
pub mod migrate;
pub mod query;
pub mod runs;

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use vulnstore_core::metrics::{NoopMetrics, RecordingMetrics, StoreMetrics};
use vulnstore_store::{EnrichmentStore, StoreConfig};

/// Where the store lives. `--config` wins over `--db`.
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Database file
    #[arg(long, default_value = ".vulnstore/store.db")]
    pub db: PathBuf,

    /// TOML store configuration
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl StoreArgs {
    pub fn store_config(&self) -> Result<StoreConfig, Box<dyn std::error::Error>> {
        let config = match &self.config {
            Some(path) => StoreConfig::load(path)?,
            None => StoreConfig::new(&self.db),
        };
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(config)
    }

    /// Open the store; with `stats`, also return the metrics it reports to.
    pub fn open(
        &self,
        stats: bool,
    ) -> Result<(EnrichmentStore, Option<Arc<RecordingMetrics>>), Box<dyn std::error::Error>> {
        let config = self.store_config()?;
        let recording = stats.then(|| Arc::new(RecordingMetrics::new()));
        let metrics: Arc<dyn StoreMetrics> = match &recording {
            Some(m) => Arc::clone(m) as Arc<dyn StoreMetrics>,
            None => Arc::new(NoopMetrics),
        };
        let store = EnrichmentStore::with_metrics(config, metrics)?;
        Ok((store, recording))
    }
}

/// Print recorded query stats to stderr
pub fn print_stats(metrics: &RecordingMetrics) {
    for (op, label, s) in metrics.snapshot() {
        eprintln!(
            "{} {} count={} total_ms={}",
            op,
            label,
            s.count,
            s.total.as_millis()
        );
    }
}
