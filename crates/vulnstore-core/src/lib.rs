//! vulnstore core - domain types and facilities shared by the enrichment store
//!
//! Provides:
//! - Enrichment records, fingerprints and ingestion run references
//! - Content hashing used for deduplication
//! - Structured error facility (`ExError`)
//! - Structured logging facility and canonical field names
//! - The injected metrics handle (`StoreMetrics`)

pub mod errors;
pub mod hash;
pub mod logging_facility;
pub mod metrics;
pub mod model;
pub mod schema;

// Re-export commonly used types
pub use errors::{ConfigError, ExError, ExErrorKind, Result};
pub use hash::{hash_enrichment, DedupKey, HASH_KIND};
pub use metrics::{NoopMetrics, RecordingMetrics, StoreMetrics};
pub use model::{EnrichmentRecord, Fingerprint, IngestionRun, RunRef, UpdateKind};
