// Test suite for enrichment ingestion
// Covers run creation, content deduplication and the run ledger

mod common;

use common::*;
use std::sync::Arc;
use tempfile::TempDir;
use vulnstore_core::metrics::{RecordingMetrics, LABEL_CREATE, LABEL_INSERT_BATCH};
use vulnstore_core::{ExErrorKind, Fingerprint, UpdateKind};

#[test]
fn test_ingest_returns_committed_run() {
    let (_temp_dir, store) = setup_store();

    let run_ref = store
        .update_enrichments(
            "osv",
            &Fingerprint::new("etag-1"),
            &[record(&["a", "b"], "X"), record(&["c"], "Y")],
        )
        .unwrap();

    let run = store.latest_run("osv").unwrap().expect("run should exist");
    assert_eq!(run.run_ref, run_ref);
    assert_eq!(run.updater, "osv");
    assert_eq!(run.fingerprint, Fingerprint::new("etag-1"));
    assert_eq!(run.kind, UpdateKind::Enrichment);
    assert_eq!(store.run_record_count(&run_ref).unwrap(), 2);
}

#[test]
fn test_same_record_twice_stored_once_linked_twice() {
    let (_temp_dir, store) = setup_store();
    let fp = Fingerprint::new("fp");

    let run1 = store
        .update_enrichments("osv", &fp, &[record(&["a", "b"], "X")])
        .unwrap();
    let run2 = store
        .update_enrichments("osv", &fp, &[record(&["a", "b"], "X")])
        .unwrap();
    assert_ne!(run1, run2);

    let conn = raw_conn(&store);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM enrichment"), 1);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM uo_enrich"), 2);
    assert_eq!(store.run_record_count(&run1).unwrap(), 1);
    assert_eq!(store.run_record_count(&run2).unwrap(), 1);
}

#[test]
fn test_tag_order_does_not_create_new_record() {
    let (_temp_dir, store) = setup_store();
    let fp = Fingerprint::new("fp");

    store
        .update_enrichments("osv", &fp, &[record(&["b", "a"], "X")])
        .unwrap();
    store
        .update_enrichments("osv", &fp, &[record(&["a", "b"], "X")])
        .unwrap();

    let conn = raw_conn(&store);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM enrichment"), 1);
    let stored: String = conn
        .query_row("SELECT tags FROM enrichment", [], |r| r.get(0))
        .unwrap();
    assert_eq!(stored, r#"["a","b"]"#);
}

#[test]
fn test_duplicates_within_one_batch_link_once() {
    let (_temp_dir, store) = setup_store();

    let run_ref = store
        .update_enrichments(
            "osv",
            &Fingerprint::new("fp"),
            &[record(&["a"], "X"), record(&["a"], "X"), record(&["a"], "X")],
        )
        .unwrap();

    assert_eq!(store.run_record_count(&run_ref).unwrap(), 1);
    assert_eq!(count(&raw_conn(&store), "SELECT COUNT(*) FROM enrichment"), 1);
}

#[test]
fn test_same_content_is_separate_per_updater() {
    let (_temp_dir, store) = setup_store();
    let fp = Fingerprint::new("fp");

    store
        .update_enrichments("osv", &fp, &[record(&["a"], "X")])
        .unwrap();
    store
        .update_enrichments("nvd", &fp, &[record(&["a"], "X")])
        .unwrap();

    assert_eq!(count(&raw_conn(&store), "SELECT COUNT(*) FROM enrichment"), 2);
    assert_eq!(store.get_enrichment("osv", &tags(&["a"])).unwrap().len(), 1);
    assert_eq!(store.get_enrichment("nvd", &tags(&["a"])).unwrap().len(), 1);
}

#[test]
fn test_empty_batch_still_creates_run() {
    let (_temp_dir, store) = setup_store();

    let run_ref = store
        .update_enrichments("osv", &Fingerprint::new("empty"), &[])
        .unwrap();

    assert_eq!(store.run_record_count(&run_ref).unwrap(), 0);
    assert_eq!(store.list_runs("osv").unwrap().len(), 1);
}

#[test]
fn test_empty_updater_rejected() {
    let (_temp_dir, store) = setup_store();

    let err = store
        .update_enrichments("", &Fingerprint::new("fp"), &[record(&["a"], "X")])
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::InvalidInput);
    assert_eq!(count(&raw_conn(&store), "SELECT COUNT(*) FROM update_operation"), 0);
}

#[test]
fn test_sequence_numbers_increase() {
    let (_temp_dir, store) = setup_store();

    for i in 0..3 {
        store
            .update_enrichments("osv", &Fingerprint::new(format!("fp-{}", i)), &[])
            .unwrap();
    }

    let runs = store.list_runs("osv").unwrap();
    let ids: Vec<i64> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.windows(2).all(|w| w[0] > w[1]), "newest first: {:?}", ids);
    assert_eq!(runs[0].fingerprint, Fingerprint::new("fp-2"));
}

#[test]
fn test_large_batch_spans_several_flushes() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = setup_config(&temp_dir);
    config.batch_max_statements = 7;
    let store = setup_store_with(config, Arc::new(vulnstore_core::NoopMetrics));

    let records: Vec<_> = (0..500)
        .map(|i| {
            let cve = format!("CVE-2024-{:04}", i);
            record(&["bulk", cve.as_str()], &format!("payload-{}", i))
        })
        .collect();
    let run_ref = store
        .update_enrichments("osv", &Fingerprint::new("fp"), &records)
        .unwrap();

    assert_eq!(store.run_record_count(&run_ref).unwrap(), 500);
    assert_eq!(store.get_enrichment("osv", &tags(&["bulk"])).unwrap().len(), 500);
}

#[test]
fn test_metrics_handle_receives_phases() {
    let temp_dir = TempDir::new().unwrap();
    let metrics = Arc::new(RecordingMetrics::new());
    let store = setup_store_with(setup_config(&temp_dir), metrics.clone());

    store
        .update_enrichments("osv", &Fingerprint::new("fp"), &[record(&["a"], "X")])
        .unwrap();
    store.get_enrichment("osv", &tags(&["a"])).unwrap();

    assert_eq!(metrics.get("update_enrichments", LABEL_CREATE).count, 1);
    assert_eq!(metrics.get("update_enrichments", LABEL_INSERT_BATCH).count, 1);
    assert_eq!(metrics.get("get_enrichment", "query").count, 1);
}

#[test]
fn test_unknown_run_ref_not_found() {
    let (_temp_dir, store) = setup_store();

    let err = store
        .run_record_count(&vulnstore_core::RunRef::new())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_json_payload_stored_byte_for_byte() {
    let (_temp_dir, store) = setup_store();
    let line = r#"{"tags":["CVE-2024-0001"],"enrichment":{"b":1,"a":1.50}}"#;
    let parsed: vulnstore_core::EnrichmentRecord = serde_json::from_str(line).unwrap();

    store
        .update_enrichments("epss", &Fingerprint::new("fp"), &[parsed.clone()])
        .unwrap();

    let stored: Vec<u8> = raw_conn(&store)
        .query_row("SELECT data FROM enrichment", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, br#"{"b":1,"a":1.50}"#.to_vec());

    let got = store.get_enrichment("epss", &tags(&["CVE-2024-0001"])).unwrap();
    assert_eq!(got, vec![parsed]);
    assert_eq!(serde_json::to_string(&got[0]).unwrap(), line);
}

#[test]
fn test_run_ledger_errors_carry_phase() {
    let (_temp_dir, store) = setup_store();
    let run_ref = store
        .update_enrichments("osv", &Fingerprint::new("fp"), &[])
        .unwrap();
    raw_conn(&store)
        .execute_batch("DROP TABLE uo_enrich; DROP TABLE update_operation;")
        .unwrap();

    let err = store.list_runs("osv").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(err.op(), Some("list_runs"));
    assert_eq!(err.entity_id(), Some("osv"));

    let err = store.run_record_count(&run_ref).unwrap_err();
    assert_eq!(err.op(), Some("get_run"));
}
