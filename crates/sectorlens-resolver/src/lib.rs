//! Batch resolution of domains to `(company, sector)` pairs.
//!
//! [`DomainResolver`] runs every domain through the same ladder: the
//! persistent cache, then the local reference dataset, then a web lookup
//! guarded by the shared circuit breaker and retry policy. A failing
//! domain degrades to `("Unknown", "Unknown")` without affecting the rest
//! of the batch.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod lookup;
pub mod orchestrator;
pub mod progress;

pub use error::{ResolveError, Result};
pub use lookup::DomainLookup;
pub use orchestrator::{DomainResolver, DEFAULT_WORKERS};
pub use progress::{NoProgress, ProgressReporter, TracingProgress};
