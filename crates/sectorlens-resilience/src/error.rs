//! Error types for resilient calls.

use thiserror::Error;

/// Classification every error passed through the substrate must provide.
pub trait Classify {
    /// Short stable name of the error kind, used as a metrics key.
    fn kind(&self) -> &'static str;

    /// Whether another attempt could succeed.
    fn is_retryable(&self) -> bool {
        true
    }
}

/// Outcome of a failed resilient call.
#[derive(Error, Debug)]
pub enum CallError<E> {
    /// The breaker rejected the call; no attempt was made
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Name of the breaker
        name: String,
    },

    /// Every attempt failed; carries the last error
    #[error("{0}")]
    Failed(E),
}

impl<E> CallError<E> {
    /// Whether the call was short-circuited by an open breaker.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }

    /// The underlying error, if an attempt was made.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::CircuitOpen { .. } => None,
            Self::Failed(err) => Some(err),
        }
    }
}

impl<E: Classify> CallError<E> {
    /// Error kind for metrics and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CircuitOpen { .. } => "CircuitOpenError",
            Self::Failed(err) => err.kind(),
        }
    }
}

/// Errors exporting metrics.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to serialize the snapshot
    #[error("failed to serialize metrics: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failed to write the export file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
