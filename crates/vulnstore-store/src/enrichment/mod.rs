//! Enrichment persistence.
//!
//! ## Responsibilities
//!
//! - Ingest a batch of records as one atomic run (`ingest`)
//! - Deduplicate records by content per updater
//! - Answer tag-filtered queries against the latest committed run (`query`)
//! - Expose the run ledger read-only (`runs`)
//!
//! ## Non-Responsibilities
//!
//! - Removing superseded runs or orphaned records
//! - Interpreting payload bytes

pub mod ingest;
pub mod query;
pub mod runs;

/// `update_operation.kind` value for enrichment runs
pub const KIND_ENRICHMENT: &str = "enrichment";

pub use ingest::{update_enrichments, IngestOptions};
pub use query::get_enrichment;
pub use runs::{get_run, latest_run, list_runs, run_record_count};
