//! Matcher error types.

use thiserror::Error;

/// Errors loading the reference dataset.
#[derive(Debug, Error)]
pub enum MatcherError {
    /// The reference file could not be parsed
    #[error("failed to read reference dataset: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error reading the reference file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for matcher operations.
pub type Result<T> = std::result::Result<T, MatcherError>;
