//! # Database Error Types
//!
//! Error types for persistence and the transactional engine components.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← adds context and categorization               │
//! │       │     │                                                           │
//! │       │     └── Domain(CoreError): business violations detected        │
//! │       │         inside a transaction (insufficient stock,              │
//! │       │         overpayment, missing member) surface transparently     │
//! │       ▼                                                                 │
//! │  Caller decides: validation/not-found → user message,                  │
//! │                  ConcurrencyConflict → retry whole operation           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use kasira_core::CoreError;

/// Database and transaction errors.
///
/// These errors wrap sqlx errors with additional context, and carry
/// domain errors raised while a transaction was open (the transaction is
/// rolled back before the error reaches the caller).
#[derive(Debug, Error)]
pub enum DbError {
    /// A business rule violation detected during a persistence operation.
    ///
    /// Transparent so callers can match directly on
    /// [`kasira_core::CoreError`] variants.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Lost the race on a contended row (receivable, stock).
    ///
    /// ## When This Occurs
    /// - Two cashiers record payments against the same receivable
    /// - Two terminals settle carts draining the same product's stock
    ///
    /// The failed operation wrote nothing; the caller should retry the
    /// WHOLE operation, not patch around it.
    #[error("Concurrent update conflict: {0}; retry the operation")]
    ConcurrencyConflict(String),

    /// Unique constraint violation.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Payload (de)serialization failed (suspended-cart lines).
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx busy / locked          → DbError::ConcurrencyConflict
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message().to_string();

                // SQLite reports lock contention as "database is locked"
                // (SQLITE_BUSY) or "database table is locked"
                // (SQLITE_LOCKED). Both mean: lost the race, retry.
                if msg.contains("database is locked")
                    || msg.contains("database table is locked")
                    || msg.contains("snapshot")
                {
                    return DbError::ConcurrencyConflict(msg);
                }

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
                    DbError::ForeignKeyViolation { message: msg }
                } else {
                    DbError::QueryFailed(msg)
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

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use kasira_core::Money;

    #[test]
    fn test_domain_error_is_transparent() {
        let err: DbError = CoreError::PaymentExceedsBalance {
            remaining: Money::from_cents(750),
        }
        .into();

        assert_eq!(
            err.to_string(),
            "Payment exceeds outstanding balance: at most 750 accepted"
        );
        assert!(matches!(
            err,
            DbError::Domain(CoreError::PaymentExceedsBalance { .. })
        ));
    }
}
