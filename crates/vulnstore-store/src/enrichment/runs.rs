//! Read-only queries over the run ledger.
//!
//! Only committed runs are ever visible here; in-flight ingestions hold
//! their rows inside an uncommitted transaction.

use crate::enrichment::KIND_ENRICHMENT;
use crate::errors::{persistence, Result};
use rusqlite::{Connection, OptionalExtension, Row};
use vulnstore_core::errors::{ExError, ExErrorKind};
use vulnstore_core::model::{Fingerprint, IngestionRun, RunRef, UpdateKind};

const COLUMNS: &str = "id, ref, updater, fingerprint, kind, date";

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<IngestionRun> {
    let run_ref: String = row.get(1)?;
    let run_ref = run_ref.parse::<RunRef>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let kind: String = row.get(4)?;
    let kind = match kind.as_str() {
        "vulnerability" => UpdateKind::Vulnerability,
        "enrichment" => UpdateKind::Enrichment,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown update kind '{}'", other).into(),
            ))
        }
    };
    Ok(IngestionRun {
        id: row.get(0)?,
        run_ref,
        updater: row.get(2)?,
        fingerprint: Fingerprint::new(row.get::<_, String>(3)?),
        kind,
        date: row.get(5)?,
    })
}

/// Latest committed enrichment run for `updater`, if any.
///
/// Updaters compare its fingerprint with upstream before fetching again.
pub fn latest_run(conn: &Connection, updater: &str) -> Result<Option<IngestionRun>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM update_operation
             WHERE updater = ?1 AND kind = ?2
             ORDER BY id DESC LIMIT 1",
            COLUMNS
        ),
        rusqlite::params![updater, KIND_ENRICHMENT],
        row_to_run,
    )
    .optional()
    .map_err(|e| persistence("latest_run", "Failed to query latest run", e).with_entity_id(updater))
}

/// All committed enrichment runs for `updater`, newest first.
pub fn list_runs(conn: &Connection, updater: &str) -> Result<Vec<IngestionRun>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM update_operation
             WHERE updater = ?1 AND kind = ?2
             ORDER BY id DESC",
            COLUMNS
        ))
        .map_err(|e| {
            persistence("list_runs", "Failed to prepare query", e).with_entity_id(updater)
        })?;
    let runs = stmt
        .query_map(rusqlite::params![updater, KIND_ENRICHMENT], row_to_run)
        .map_err(|e| {
            persistence("list_runs", "Failed to query runs", e).with_entity_id(updater)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("list_runs", "Failed to read run row", e).with_entity_id(updater))?;
    Ok(runs)
}

/// Look up a run by its external reference.
///
/// # Errors
///
/// - `NotFound`: no run has this reference
pub fn get_run(conn: &Connection, run_ref: &RunRef) -> Result<IngestionRun> {
    conn.query_row(
        &format!("SELECT {} FROM update_operation WHERE ref = ?1", COLUMNS),
        [run_ref.to_string()],
        row_to_run,
    )
    .optional()
    .map_err(|e| {
        persistence("get_run", "Failed to query run", e).with_entity_id(run_ref.to_string())
    })?
    .ok_or_else(|| {
        ExError::new(ExErrorKind::NotFound)
            .with_op("get_run")
            .with_entity_id(run_ref.to_string())
            .with_message("run not found")
    })
}

/// Number of records associated with the run `run_ref`.
///
/// # Errors
///
/// - `NotFound`: no run has this reference
pub fn run_record_count(conn: &Connection, run_ref: &RunRef) -> Result<usize> {
    let run = get_run(conn, run_ref)?;
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM uo_enrich WHERE uo = ?1",
            [run.id],
            |row| row.get(0),
        )
        .map_err(|e| {
            persistence("run_record_count", "Failed to count associations", e)
                .with_entity_id(run_ref.to_string())
        })?;
    Ok(count as usize)
}
