//! Database error types.

use thiserror::Error;

/// Cache store errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open or create database connection.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// The store did not answer a liveness query.
    #[error("cache store unreachable: {0}")]
    Unreachable(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Failed to read or write the CSV mirror.
    #[error("CSV mirror error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error during cache operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
