//! Web resolver error types.

use sectorlens_db::DatabaseError;
use sectorlens_resilience::{CallError, Classify};
use thiserror::Error;

/// Errors raised while resolving a domain on the web.
#[derive(Debug, Error)]
pub enum WebError {
    /// Connection failure or a dropped response body
    #[error("network error fetching {url}: {message}")]
    Transient {
        /// Requested URL
        url: String,
        /// Underlying error
        message: String,
    },

    /// The request did not finish within the configured timeout
    #[error("timeout fetching {url}")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// Captcha, parking page or another response that carries no signal
    #[error("blocked or invalid response from {url}: {reason}")]
    Blocked {
        /// Requested URL
        url: String,
        /// What gave it away
        reason: String,
    },

    /// Unexpected HTTP status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Status code
        status: u16,
    },

    /// A circuit breaker rejected the call
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen {
        /// Name of the breaker
        name: String,
    },

    /// A response could not be decoded
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Writing the resolved value failed
    #[error("cache error: {0}")]
    Cache(#[from] DatabaseError),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl WebError {
    fn is_transient_status(status: u16) -> bool {
        status == 429 || (500..600).contains(&status)
    }
}

impl Classify for WebError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Transient { .. } | Self::Timeout { .. } => "TransientNetworkError",
            Self::Status { status, .. } if Self::is_transient_status(*status) => {
                "TransientNetworkError"
            }
            Self::Status { .. } | Self::Blocked { .. } => "BlockedOrInvalidResponse",
            Self::CircuitOpen { .. } => "CircuitOpenError",
            Self::Parse(_) => "ParseError",
            Self::Cache(_) => "CacheError",
            Self::Client(_) => "ClientError",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => Self::is_transient_status(*status),
            _ => false,
        }
    }
}

impl From<CallError<WebError>> for WebError {
    fn from(err: CallError<WebError>) -> Self {
        match err {
            CallError::CircuitOpen { name } => Self::CircuitOpen { name },
            CallError::Failed(inner) => inner,
        }
    }
}

/// Result type alias for web operations.
pub type Result<T> = std::result::Result<T, WebError>;
