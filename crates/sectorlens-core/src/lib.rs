//! SectorLens Core - Foundation crate for the SectorLens resolver.
//!
//! This crate provides the shared types, error handling and configuration
//! that every other SectorLens crate depends on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`Domain`, `CompanySector`, `ResolutionResult`)
//!
//! # Example
//!
//! ```rust
//! use sectorlens_core::{AppConfig, Domain};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.resolver.workers, 5);
//!
//! let domain = Domain::from_email("jane@mail.acme.co.uk")?;
//! assert_eq!(domain.as_str(), "acme");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AlertThresholds, AppConfig, BreakerPolicy, CacheConfig, MonitoringConfig, ResilienceConfig,
    ResolverConfig, RetryPolicy, WebConfig,
};
pub use error::{ConfigError, ConfigResult, Result, SectorlensError};
pub use types::{
    CompanySector, Confidence, Domain, ResolutionResult, ResolutionSource, BUSINESS_SERVICES,
    UNKNOWN,
};
