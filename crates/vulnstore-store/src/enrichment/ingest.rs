//! Enrichment ingestion.
//!
//! One call opens one write transaction, creates one `update_operation` row,
//! queues an insert-or-ignore plus an association for every record, flushes
//! the batch and commits. Any failure drops the transaction, which rolls
//! everything back: a run is either fully visible or absent.

use crate::config::StoreConfig;
use crate::enrichment::KIND_ENRICHMENT;
use crate::errors::{invalid_input, persistence, Result};
use crate::microbatch::{BatchInsert, CancelToken};
use rusqlite::types::Value;
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;
use vulnstore_core::errors::{ExError, ExErrorKind};
use vulnstore_core::hash::hash_enrichment;
use vulnstore_core::metrics::{StoreMetrics, LABEL_CREATE, LABEL_INSERT_BATCH};
use vulnstore_core::model::{EnrichmentRecord, Fingerprint, RunRef};

pub(crate) const OP: &str = "update_enrichments";

const CREATE: &str = r#"
    INSERT INTO update_operation (ref, updater, fingerprint, kind, date)
    VALUES (?1, ?2, ?3, ?4, ?5)
    RETURNING id
"#;

const INSERT: &str = r#"
    INSERT INTO enrichment (hash_kind, hash, updater, tags, data)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (hash_kind, hash, updater) DO NOTHING
"#;

// The record id is resolved inside the same transaction, so it sees rows
// inserted by earlier statements of this batch.
const ASSOC: &str = r#"
    INSERT INTO uo_enrich (enrich, updater, uo, date)
    VALUES (
        (SELECT id FROM enrichment WHERE hash_kind = ?1 AND hash = ?2 AND updater = ?3),
        ?3,
        ?4,
        ?5
    )
    ON CONFLICT (enrich, uo) DO NOTHING
"#;

/// Per-call controls for an ingestion.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub cancel: Option<CancelToken>,
}

/// Create a new enrichment run for `updater`, store `records` deduplicated
/// by content, link them to the run and commit.
///
/// Returns the new run's reference. An empty `records` slice still creates
/// (and commits) a run, which then shadows earlier runs for readers.
///
/// # Errors
///
/// - `InvalidInput`: `updater` is empty
/// - `Persistence`/`Timeout`: transaction could not be opened or committed
///   (`begin_tx`, `commit`), the run row could not be created (`create_run`),
///   or a batched statement failed (`batch_queue`, `batch_flush`)
/// - `ConstraintViolation`: a write hit a constraint other than the expected
///   dedup conflicts
/// - `Timeout`/`Cancelled`: the configured deadline passed or the caller
///   cancelled, whether mid-batch or after the last flush (op `commit`)
pub fn update_enrichments(
    conn: &mut Connection,
    config: &StoreConfig,
    metrics: &dyn StoreMetrics,
    updater: &str,
    fingerprint: &Fingerprint,
    records: &[EnrichmentRecord],
    options: &IngestOptions,
) -> Result<RunRef> {
    if updater.is_empty() {
        return Err(invalid_input("create_run", "updater name must not be empty"));
    }
    let deadline = config.ingest_timeout().map(|t| Instant::now() + t);

    // Immediate: take the write lock now so sequence numbers are handed out
    // in commit order.
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| {
            persistence("begin_tx", "Unable to start transaction", e).with_entity_id(updater)
        })?;

    let run_ref = RunRef::new();
    let now = chrono::Utc::now().timestamp_millis();

    let start = Instant::now();
    let id: i64 = tx
        .query_row(
            CREATE,
            rusqlite::params![
                run_ref.to_string(),
                updater,
                fingerprint.as_str(),
                KIND_ENRICHMENT,
                now
            ],
            |row| row.get(0),
        )
        .map_err(|e| {
            persistence("create_run", "Failed to create update_operation", e)
                .with_entity_id(updater)
        })?;
    metrics.record_query(OP, LABEL_CREATE, start.elapsed());

    tracing::debug!(
        updater = %updater,
        run_ref = %run_ref,
        id = id,
        "update_operation created"
    );

    let start = Instant::now();
    let mut batch = BatchInsert::new(&tx, config.batch_max_statements, config.batch_max_wait())
        .with_deadline(deadline);
    if let Some(cancel) = &options.cancel {
        batch = batch.with_cancel(cancel.clone());
    }

    for record in records {
        let key = hash_enrichment(record);
        let tags = canonical_tags(&record.tags)?;

        batch
            .queue(
                INSERT,
                [
                    Value::Text(key.kind.to_string()),
                    Value::Blob(key.digest.clone()),
                    Value::Text(updater.to_string()),
                    Value::Text(tags),
                    Value::Blob(record.enrichment.clone()),
                ],
            )
            .map_err(|e| e.with_entity_id(updater))?;
        batch
            .queue(
                ASSOC,
                [
                    Value::Text(key.kind.to_string()),
                    Value::Blob(key.digest),
                    Value::Text(updater.to_string()),
                    Value::Integer(id),
                    Value::Integer(now),
                ],
            )
            .map_err(|e| e.with_entity_id(updater))?;
    }
    batch.done().map_err(|e| e.with_entity_id(updater))?;
    metrics.record_query(OP, LABEL_INSERT_BATCH, start.elapsed());

    if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
        return Err(ExError::new(ExErrorKind::Cancelled)
            .with_op("commit")
            .with_entity_id(updater)
            .with_message("ingestion cancelled before commit"));
    }
    if deadline.is_some_and(|d| Instant::now() >= d) {
        return Err(ExError::new(ExErrorKind::Timeout)
            .with_op("commit")
            .with_entity_id(updater)
            .with_message("ingestion deadline exceeded before commit"));
    }

    tx.commit().map_err(|e| {
        persistence("commit", "Failed to commit transaction", e).with_entity_id(updater)
    })?;

    tracing::debug!(
        updater = %updater,
        run_ref = %run_ref,
        inserted = records.len(),
        "update_operation committed"
    );

    Ok(run_ref)
}

/// Tags as stored: sorted JSON array, matching the order the hasher uses.
fn canonical_tags(tags: &[String]) -> Result<String> {
    let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    serde_json::to_string(&sorted).map_err(|e| ExError::from(e).with_op("batch_queue"))
}
