//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError (port boundary) ← failures become CoreError::Storage        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (HTTP) ← Serialized for storefront clients                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shopkeep_core::{ActorId, CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second inventory record for one product
    /// - Same product twice in one cart
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Inventory or cart item for a product that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Rejected before reaching SQLite (blank title, negative price).
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Cart lines a purchase meant to consume were already gone or changed.
    ///
    /// ## When This Occurs
    /// - Two checkouts of the same cart race; the second commit finds
    ///   nothing left to delete and rolls back
    #[error("Cart changed during checkout for actor {0}")]
    CartChanged(ActorId),

    /// CHECK constraint violation (e.g. `stock >= 0`).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl ToString) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.to_string(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports constraint failures only through the message:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Input and cart conflicts keep their domain meaning; everything else
/// that reaches the engine through a port becomes a storage failure.
/// Domain-level "not found" answers are produced by the repositories
/// themselves, never by this conversion.
impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => CoreError::Validation(e),
            DbError::CartChanged(actor_id) => CoreError::CartChanged(actor_id),
            other => CoreError::Storage(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Purchase", 42);
        assert_eq!(err.to_string(), "Purchase not found: 42");
    }

    #[test]
    fn test_converts_to_storage_error() {
        let core: CoreError = DbError::PoolExhausted.into();
        assert!(matches!(core, CoreError::Storage(ref m) if m == "Connection pool exhausted"));
        assert!(core.kind().is_retryable());
    }

    #[test]
    fn test_cart_changed_stays_a_conflict() {
        let core: CoreError = DbError::CartChanged(ActorId(1)).into();
        assert!(matches!(core, CoreError::CartChanged(ActorId(1))));
        assert_eq!(core.kind(), shopkeep_core::ErrorKind::Conflict);

        let core: CoreError = DbError::from(ValidationError::Required {
            field: "title".to_string(),
        })
        .into();
        assert_eq!(core.kind(), shopkeep_core::ErrorKind::Input);
    }
}
