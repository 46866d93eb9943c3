//! Orchestrator error types.

use sectorlens_db::DatabaseError;
use sectorlens_web::WebError;
use thiserror::Error;

/// Errors raised while resolving a batch.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The cache store could not be reached; fatal for a run
    #[error("cache store unavailable: {0}")]
    CacheUnavailable(#[from] DatabaseError),

    /// The web lookup for one domain failed
    #[error("lookup failed for {domain}: {source}")]
    Lookup {
        /// Domain being resolved
        domain: String,
        /// Last error seen
        source: WebError,
    },
}

/// Result type alias for orchestrator operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
