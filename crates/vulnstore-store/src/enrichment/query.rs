//! Latest-snapshot enrichment lookup.

use crate::enrichment::KIND_ENRICHMENT;
use crate::errors::{persistence, Result};
use rusqlite::Connection;
use std::time::Instant;
use vulnstore_core::errors::ExError;
use vulnstore_core::metrics::{StoreMetrics, LABEL_QUERY};
use vulnstore_core::model::EnrichmentRecord;

pub(crate) const OP: &str = "get_enrichment";

// "Latest" is the committed run with the highest sequence number. The tag
// filter is an overlap test between the stored array and the bound array.
const QUERY: &str = r#"
    WITH latest AS (
        SELECT max(id) AS id
        FROM update_operation
        WHERE updater = ?1 AND kind = ?2
    )
    SELECT e.tags, e.data
    FROM enrichment AS e
    JOIN uo_enrich AS uo ON uo.enrich = e.id
    JOIN latest ON uo.uo = latest.id
    WHERE EXISTS (
        SELECT 1
        FROM json_each(e.tags) AS t
        WHERE t.value IN (SELECT value FROM json_each(?3))
    )
    ORDER BY e.id
"#;

/// Return the records of `updater`'s latest committed run whose tags share
/// at least one element with `tags`.
///
/// An updater without runs yields an empty vector. An empty `tags` filter
/// also yields an empty vector, without touching the database.
///
/// # Errors
///
/// - `Persistence`: the read transaction or query failed (`query_latest`)
/// - `Serialization`: a stored tag array could not be decoded
pub fn get_enrichment(
    conn: &mut Connection,
    metrics: &dyn StoreMetrics,
    updater: &str,
    tags: &[String],
) -> Result<Vec<EnrichmentRecord>> {
    if tags.is_empty() {
        tracing::debug!(updater = %updater, "Empty tag filter, returning no enrichments");
        return Ok(Vec::new());
    }

    let filter =
        serde_json::to_string(tags).map_err(|e| ExError::from(e).with_op("query_latest"))?;

    // A read transaction pins one snapshot for the whole statement, including
    // the max(id) subquery.
    let tx = conn.transaction().map_err(|e| {
        persistence("query_latest", "Unable to start transaction", e).with_entity_id(updater)
    })?;

    let start = Instant::now();
    let rows = {
        let mut stmt = tx.prepare_cached(QUERY).map_err(|e| {
            persistence("query_latest", "Failed to prepare query", e).with_entity_id(updater)
        })?;
        let mapped = stmt
            .query_map(
                rusqlite::params![updater, KIND_ENRICHMENT, filter],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)),
            )
            .map_err(|e| {
                persistence("query_latest", "Failed to query enrichments", e)
                    .with_entity_id(updater)
            })?;
        mapped
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                persistence("query_latest", "Failed to read enrichment row", e)
                    .with_entity_id(updater)
            })?
    };
    metrics.record_query(OP, LABEL_QUERY, start.elapsed());

    let mut results = Vec::with_capacity(rows.len());
    for (tags_json, data) in rows {
        let tags: Vec<String> = serde_json::from_str(&tags_json)
            .map_err(|e| ExError::from(e).with_op("query_latest").with_entity_id(updater))?;
        results.push(EnrichmentRecord {
            tags,
            enrichment: data,
        });
    }

    // Read-only; ending it is enough.
    tx.finish().map_err(|e| {
        persistence("query_latest", "Failed to end read transaction", e).with_entity_id(updater)
    })?;

    Ok(results)
}
