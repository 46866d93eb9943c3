//! Core error types for SectorLens.
//!
//! Input normalization fails with [`SectorlensError`]; loading and
//! validating the configuration fails with [`ConfigError`].

use thiserror::Error;

/// Errors raised while turning raw input into a [`crate::Domain`].
#[derive(Error, Debug)]
pub enum SectorlensError {
    /// Invalid domain or email input
    #[error("invalid domain '{input}': {reason}")]
    InvalidDomain {
        /// Raw input that failed normalization
        input: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// I/O error reading/writing config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `SectorlensError`.
pub type Result<T> = std::result::Result<T, SectorlensError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SectorlensError::InvalidDomain {
            input: "a b".to_string(),
            reason: "contains whitespace".to_string(),
        };
        assert_eq!(err.to_string(), "invalid domain 'a b': contains whitespace");

        let err = ConfigError::InvalidValue {
            field: "resolver.workers".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value for resolver.workers: must be at least 1"
        );
    }
}
