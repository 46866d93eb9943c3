//! Offline domain matching for SectorLens.
//!
//! Resolves a domain against a reference dataset without touching the
//! network. Strategies run in a fixed order and the first hit wins:
//!
//! 1. exact domain
//! 2. domain + `.com`
//! 3. domain without a known extension
//! 4. containment (length difference ≤ 3)
//! 5. fuzzy (ratio, partial ratio, token sort, token set)
//! 6. domain without digits and business suffix
//! 7. synthesis from the domain's own words, or hand-off to the web resolver
//!
//! # Example
//!
//! ```rust
//! use sectorlens_matcher::{LocalMatcher, MatchOutcome, ReferenceRow, ReferenceTable};
//! use std::sync::Arc;
//!
//! let table = ReferenceTable::from_rows([ReferenceRow::new("acme.com", "Acme", "Retail")]);
//! let matcher = LocalMatcher::new(Arc::new(table));
//! assert!(matches!(matcher.match_domain("acme"), MatchOutcome::Matched { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod fuzz;
pub mod matcher;
pub mod reference;
pub mod synth;

pub use error::{MatcherError, Result};
pub use fuzz::FuzzyMetric;
pub use matcher::{LocalMatcher, MatchKind, MatchOutcome, DEFAULT_FUZZY_THRESHOLD};
pub use reference::{ReferenceRow, ReferenceTable};
