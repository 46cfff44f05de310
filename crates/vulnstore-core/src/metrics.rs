//! Observability handle injected into the store.
//!
//! The store reports every timed database phase through [`StoreMetrics`].
//! Implementations decide what to do with it; there is no process-global
//! registry.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

/// Labels used by the ingestion writer
pub const LABEL_CREATE: &str = "create";
pub const LABEL_INSERT_BATCH: &str = "insert_batch";
/// Label used by the snapshot reader
pub const LABEL_QUERY: &str = "query";

/// Sink for per-phase query counts and durations.
pub trait StoreMetrics: Send + Sync {
    /// Record one completed phase of `op` (e.g. `update_enrichments`/`create`).
    fn record_query(&self, op: &str, label: &str, elapsed: Duration);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl StoreMetrics for NoopMetrics {
    fn record_query(&self, _op: &str, _label: &str, _elapsed: Duration) {}
}

/// Aggregate for one (op, label) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub count: u64,
    pub total: Duration,
}

/// Keeps counters in memory; thread-safe.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    stats: Mutex<BTreeMap<(String, String), QueryStats>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stats for one (op, label) pair; zero if never recorded.
    pub fn get(&self, op: &str, label: &str) -> QueryStats {
        self.stats
            .lock()
            .ok()
            .and_then(|m| m.get(&(op.to_string(), label.to_string())).copied())
            .unwrap_or_default()
    }

    /// Snapshot of all recorded pairs, ordered by op then label.
    pub fn snapshot(&self) -> Vec<(String, String, QueryStats)> {
        self.stats
            .lock()
            .map(|m| {
                m.iter()
                    .map(|((op, label), s)| (op.clone(), label.clone(), *s))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl StoreMetrics for RecordingMetrics {
    fn record_query(&self, op: &str, label: &str, elapsed: Duration) {
        if let Ok(mut m) = self.stats.lock() {
            let entry = m.entry((op.to_string(), label.to_string())).or_default();
            entry.count += 1;
            entry.total += elapsed;
        }
    }
}
