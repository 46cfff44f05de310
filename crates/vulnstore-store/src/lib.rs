//! vulnstore Store - SQLite persistence for versioned enrichment data
//!
//! Provides:
//! - SQLite schema with migrations framework
//! - Batched statement execution (`microbatch`)
//! - Atomic, deduplicated enrichment ingestion
//! - Latest-run, tag-filtered enrichment queries
//! - `EnrichmentStore` facade with injected metrics

pub mod config;
pub mod db;
pub mod enrichment;
pub mod errors;
pub mod microbatch;
pub mod migrations;
pub mod store;

// Re-export key types
pub use config::StoreConfig;
pub use errors::Result;
pub use microbatch::CancelToken;
pub use store::EnrichmentStore;
