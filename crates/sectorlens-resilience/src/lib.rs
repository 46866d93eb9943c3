//! Error-recovery substrate for SectorLens.
//!
//! Everything that makes repeated, unreliable calls to third parties
//! tolerable: per-host rate limiting, circuit breakers, retry with
//! exponential backoff, and a metrics collector that observes all of it.
//!
//! Nothing in this crate is global. A single [`Resilience`] bundle is
//! constructed at startup and shared through `Arc`.
//!
//! # Example
//!
//! ```rust,no_run
//! use sectorlens_core::{BreakerPolicy, RetryPolicy};
//! use sectorlens_resilience::{Classify, Resilience};
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "flaky")
//!     }
//! }
//!
//! impl Classify for Flaky {
//!     fn kind(&self) -> &'static str {
//!         "Flaky"
//!     }
//! }
//!
//! # async fn example() {
//! let resilience = Resilience::new(BreakerPolicy::default());
//! let breaker = resilience.breakers().default_breaker();
//! let result: Result<u32, _> = resilience
//!     .call(&breaker, &RetryPolicy::default(), "example.com", || async { Err(Flaky) })
//!     .await;
//! assert!(result.is_err());
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerts;
pub mod breakers;
pub mod circuit_breaker;
pub mod error;
pub mod metrics;
pub mod rate_limiter;
pub mod resilient;
pub mod retry;

pub use alerts::{Alert, AlertKind};
pub use breakers::BreakerRegistry;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use error::{CallError, Classify, MetricsError};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use rate_limiter::RateLimiter;
pub use resilient::Resilience;
pub use retry::{delay_for_attempt, raw_delay, Retry};
