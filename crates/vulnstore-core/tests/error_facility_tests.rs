use vulnstore_core::errors::{ConfigError, ExError, ExErrorKind};

#[test]
fn test_builder_fields_round_trip() {
    let err = ExError::new(ExErrorKind::NotFound)
        .with_op("run_record_count")
        .with_entity_id("5c1f2b1e-0000-4000-8000-000000000000")
        .with_message("run not found");

    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.code(), "ERR_NOT_FOUND");
    assert_eq!(err.op(), Some("run_record_count"));
    assert_eq!(
        err.entity_id(),
        Some("5c1f2b1e-0000-4000-8000-000000000000")
    );
    assert_eq!(err.message(), "run not found");
    assert!(err.source_error().is_none());
}

#[test]
fn test_source_chain_preserved() {
    let root = ExError::new(ExErrorKind::Persistence).with_message("database is locked");
    let err = ExError::new(ExErrorKind::Persistence)
        .with_op("begin_tx")
        .with_source(root);

    let source = err.source_error().expect("source should be set");
    assert_eq!(source.message(), "database is locked");
}

#[test]
fn test_config_parse_error_conversion() {
    let err: ExError = ConfigError::Parse {
        message: "expected `=`".into(),
    }
    .into();
    assert_eq!(err.kind(), ExErrorKind::Config);
    assert_eq!(err.op(), Some("config_parse"));
}

#[test]
fn test_serde_json_error_is_serialization_kind() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: ExError = json_err.into();
    assert_eq!(err.kind(), ExErrorKind::Serialization);
}
