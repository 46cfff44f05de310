// Shared fixtures for store integration tests
#![allow(dead_code)]

use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;
use vulnstore_core::metrics::StoreMetrics;
use vulnstore_core::model::EnrichmentRecord;
use vulnstore_store::{EnrichmentStore, StoreConfig};

pub fn setup_config(temp_dir: &TempDir) -> StoreConfig {
    StoreConfig::new(temp_dir.path().join("store.db"))
}

pub fn setup_store() -> (TempDir, EnrichmentStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = EnrichmentStore::open(setup_config(&temp_dir)).unwrap();
    (temp_dir, store)
}

pub fn setup_store_with(
    config: StoreConfig,
    metrics: Arc<dyn StoreMetrics>,
) -> EnrichmentStore {
    EnrichmentStore::with_metrics(config, metrics).unwrap()
}

/// A second, raw connection for inspecting tables directly
pub fn raw_conn(store: &EnrichmentStore) -> Connection {
    Connection::open(&store.config().path).unwrap()
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

pub fn record(tags: &[&str], payload: &str) -> EnrichmentRecord {
    EnrichmentRecord::new(tags.iter().copied(), payload)
}

pub fn tags(t: &[&str]) -> Vec<String> {
    t.iter().map(|s| s.to_string()).collect()
}

/// Payloads of `records`, sorted, for order-insensitive comparison
pub fn payloads(records: &[EnrichmentRecord]) -> Vec<String> {
    let mut out: Vec<String> = records
        .iter()
        .map(|r| String::from_utf8(r.enrichment.clone()).unwrap())
        .collect();
    out.sort();
    out
}
