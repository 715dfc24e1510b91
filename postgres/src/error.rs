//! `sqlx` error classification.

use accommodation_core::StoreError;

/// Map a `sqlx` error to a [`StoreError`] using the `SQLSTATE` code.
///
/// | SQLSTATE | Meaning | Mapped to |
/// |----------|---------|-----------|
/// | `23505` | unique violation | `UniqueViolation` |
/// | `23503` | foreign key violation | `NotFound` |
/// | `40001`, `40P01`, `55P03` | serialization failure, deadlock, lock not available | `Conflict` |
/// | anything else | | `Database` |
pub(crate) fn store_error(error: sqlx::Error) -> StoreError {
    let mapped = match &error {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some("23505") => StoreError::UniqueViolation(
                db.constraint().unwrap_or_else(|| db.message()).to_string(),
            ),
            Some("23503") => StoreError::NotFound(
                db.constraint().unwrap_or_else(|| db.message()).to_string(),
            ),
            Some("40001" | "40P01" | "55P03") => StoreError::Conflict(db.message().to_string()),
            _ => StoreError::Database(error.to_string()),
        },
        sqlx::Error::RowNotFound => StoreError::NotFound("row".to_string()),
        _ => StoreError::Database(error.to_string()),
    };

    let kind = match &mapped {
        StoreError::NotFound(_) => "not_found",
        StoreError::UniqueViolation(_) => "unique_violation",
        StoreError::Conflict(_) => "conflict",
        StoreError::Database(_) => "database",
    };
    metrics::counter!("accommodation_store_errors_total", "kind" => kind).increment(1);
    if matches!(mapped, StoreError::Database(_)) {
        tracing::error!(error = %error, "Database operation failed");
    } else {
        tracing::debug!(error = %error, kind, "Database constraint rejected write");
    }

    mapped
}
