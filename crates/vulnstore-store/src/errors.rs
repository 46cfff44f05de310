//! Error handling for vulnstore-store
//!
//! Wraps vulnstore-core ExError with store-specific helpers. Every helper
//! takes the phase name so callers can tell run creation from a failed flush
//! or commit.

use vulnstore_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Database error tagged with the phase it happened in.
///
/// Constraint failures (other than the conflicts the writer deliberately
/// ignores) surface as `ConstraintViolation`; busy/locked conditions as
/// `Timeout`; everything else as `Persistence`.
pub fn persistence(op: &str, context: &str, err: rusqlite::Error) -> ExError {
    let kind = match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => ExErrorKind::ConstraintViolation,
        Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
            ExErrorKind::Timeout
        }
        _ => ExErrorKind::Persistence,
    };
    ExError::new(kind)
        .with_op(op)
        .with_message(format!("{}: {}", context, err))
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create an invalid input error
pub fn invalid_input(op: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::InvalidInput)
        .with_op(op)
        .with_message(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_keeps_phase() {
        let err = persistence(
            "commit",
            "Failed to commit transaction",
            rusqlite::Error::InvalidQuery,
        );
        assert_eq!(err.kind(), ExErrorKind::Persistence);
        assert_eq!(err.op(), Some("commit"));
        assert!(err.message().starts_with("Failed to commit transaction"));
    }
}
