//! Error types for forum-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Unique or primary key violation (D003)
    #[error("[D003] Duplicate key: {0}")]
    UniqueViolation(String),

    /// Result row could not be decoded (D004)
    #[error("[D004] Failed to decode row: {0}")]
    DecodeError(String),

    /// Transaction control error (D005)
    #[error("[D005] Transaction error: {0}")]
    TransactionError(String),

    /// Statement rejected because an earlier one aborted the transaction (D006)
    #[error("[D006] Transaction aborted: {0}")]
    TransactionAborted(String),
}

impl DbError {
    /// True when this error only echoes an earlier failure in the same
    /// transaction
    pub fn is_transaction_aborted(&self) -> bool {
        matches!(self, DbError::TransactionAborted(_))
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

/// Server-side detail of a postgres error, falling back to the driver text.
///
/// `tokio_postgres::Error` displays as a bare "db error" for server errors,
/// so the message and SQLSTATE have to be pulled out explicitly.
fn describe(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => format!("{} (SQLSTATE {})", db.message(), db.code().code()),
        None => err.to_string(),
    }
}

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        let msg = describe(&err);
        if err.is_closed() {
            DbError::ConnectionError(msg)
        } else if err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
            DbError::UniqueViolation(msg)
        } else if err.code() == Some(&tokio_postgres::error::SqlState::IN_FAILED_SQL_TRANSACTION) {
            DbError::TransactionAborted(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}
