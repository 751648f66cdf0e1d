//! Storage error model and SQLx error mapping.
//!
//! | SQLx error | StoreError |
//! |------------|------------|
//! | Database (unique violation) | `Conflict` |
//! | Database (foreign key violation) | `Conflict` |
//! | Database (check constraint violation) | `Validation` |
//! | Database (other) | `Database` |
//! | PoolClosed / RowNotFound / other | `Database` |

use thiserror::Error;

use shopfloor_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation error.
///
/// Infrastructure errors as opposed to domain errors; domain errors raised
/// while a store merges records are folded in via `From<DomainError>`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    /// A stored row could not be decoded into a domain record.
    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(kind) => StoreError::NotFound(kind),
            other => StoreError::Validation(other.to_string()),
        }
    }
}

/// Map SQLx errors to StoreError.
pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                StoreError::Conflict(msg)
            } else if db_err.is_check_violation() {
                StoreError::Validation(msg)
            } else {
                StoreError::Database(msg)
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Database(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Check if an error is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Map errors from writes that carry references. A foreign key failure there
/// means the payload names a record that does not exist, which is a bad
/// request; deleting a referenced record stays a `Conflict`.
pub(crate) fn map_reference_error(operation: &str, references: &str, err: sqlx::Error) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::Validation(format!("{operation}: {references} must reference existing records"))
    } else {
        map_sqlx_error(operation, err)
    }
}

pub(crate) fn corrupt(field: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("{field}: {err}"))
}
