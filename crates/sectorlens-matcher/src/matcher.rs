//! Ordered local matching strategies.

use crate::fuzz::FuzzyMetric;
use crate::reference::{ReferenceRow, ReferenceTable};
use crate::synth;
use once_cell::sync::Lazy;
use regex::Regex;
use sectorlens_core::CompanySector;
use std::sync::Arc;

/// Default minimum fuzzy score.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 65.0;

/// Maximum length difference for a containment match.
const CONTAINMENT_SLACK: usize = 3;

const KNOWN_EXTENSIONS: &[&str] = &[".com", ".net", ".org", ".io", ".co", ".tech", ".biz", ".ai"];

const BUSINESS_SUFFIXES: &[&str] = &[
    "corp",
    "inc",
    "llc",
    "ltd",
    "company",
    "co",
    "group",
    "international",
    "intl",
    "global",
    "usa",
    "us",
    "solutions",
    "services",
    "systems",
    "tech",
    "technologies",
];

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Exact domain
    Exact,
    /// Domain with `.com` appended
    ComSuffix,
    /// Domain with its extension removed
    ExtensionStripped,
    /// One domain contains the other
    Containment,
    /// Fuzzy score above threshold
    Fuzzy {
        /// Metric that cleared the threshold
        metric: FuzzyMetric,
        /// Its score
        score: f64,
    },
    /// Domain without digits and business suffix
    Cleaned,
}

/// Result of [`LocalMatcher::match_domain`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Found in the reference dataset
    Matched {
        /// Company and sector from the dataset
        result: CompanySector,
        /// Strategy that matched
        kind: MatchKind,
    },
    /// Built from the domain string (web fallback disabled)
    Synthesized(CompanySector),
    /// Nothing matched; hand over to the web resolver
    Unresolved,
}

/// Offline matcher over a reference dataset.
#[derive(Debug, Clone)]
pub struct LocalMatcher {
    table: Arc<ReferenceTable>,
    fuzzy_threshold: f64,
    web_fallback: bool,
}

impl LocalMatcher {
    /// Create a matcher with the default threshold and web fallback enabled.
    pub fn new(table: Arc<ReferenceTable>) -> Self {
        Self {
            table,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            web_fallback: true,
        }
    }

    /// Set the minimum fuzzy score (0-100).
    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// When disabled, unmatched domains are synthesized instead of
    /// reported as [`MatchOutcome::Unresolved`].
    #[must_use]
    pub fn with_web_fallback(mut self, enabled: bool) -> Self {
        self.web_fallback = enabled;
        self
    }

    /// The reference dataset.
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// Run the strategies in order and return the first hit.
    pub fn match_domain(&self, domain: &str) -> MatchOutcome {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return self.unmatched(&domain);
        }

        if let Some(row) = self.table.get(&domain) {
            return matched(row, MatchKind::Exact);
        }

        if let Some(row) = self.table.get(&format!("{domain}.com")) {
            return matched(row, MatchKind::ComSuffix);
        }

        if let Some(row) = self.match_without_extension(&domain) {
            return matched(row, MatchKind::ExtensionStripped);
        }

        if let Some(row) = self.match_containment(&domain) {
            return matched(row, MatchKind::Containment);
        }

        if let Some((row, metric, score)) = self.match_fuzzy(&domain) {
            tracing::debug!(
                domain = %domain,
                candidate = %row.domain,
                %metric,
                score,
                "Fuzzy match"
            );
            return matched(row, MatchKind::Fuzzy { metric, score });
        }

        if let Some(row) = self.match_cleaned(&domain) {
            return matched(row, MatchKind::Cleaned);
        }

        self.unmatched(&domain)
    }

    fn match_without_extension(&self, domain: &str) -> Option<&ReferenceRow> {
        KNOWN_EXTENSIONS
            .iter()
            .find_map(|ext| domain.strip_suffix(ext))
            .filter(|base| !base.is_empty())
            .and_then(|base| self.table.get(base))
    }

    fn match_containment(&self, domain: &str) -> Option<&ReferenceRow> {
        self.table.rows().iter().find(|row| {
            (row.domain.contains(domain) || domain.contains(row.domain.as_str()))
                && row.domain.len().abs_diff(domain.len()) <= CONTAINMENT_SLACK
        })
    }

    fn match_fuzzy(&self, domain: &str) -> Option<(&ReferenceRow, FuzzyMetric, f64)> {
        for metric in FuzzyMetric::ALL {
            let mut best: Option<(&ReferenceRow, f64)> = None;
            for row in self.table.rows() {
                let score = metric.score(domain, &row.domain);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((row, score));
                }
            }
            if let Some((row, score)) = best {
                if score >= self.fuzzy_threshold {
                    return Some((row, metric, score));
                }
            }
        }
        None
    }

    fn match_cleaned(&self, domain: &str) -> Option<&ReferenceRow> {
        let mut cleaned = DIGITS.replace_all(domain, "").into_owned();
        if let Some(suffix) = BUSINESS_SUFFIXES.iter().find(|s| cleaned.ends_with(*s)) {
            cleaned.truncate(cleaned.len() - suffix.len());
        }
        if cleaned.is_empty() || cleaned == domain {
            return None;
        }
        self.table.get(&cleaned)
    }

    fn unmatched(&self, domain: &str) -> MatchOutcome {
        if self.web_fallback {
            MatchOutcome::Unresolved
        } else {
            MatchOutcome::Synthesized(synth::synthesize(domain))
        }
    }
}

fn matched(row: &ReferenceRow, kind: MatchKind) -> MatchOutcome {
    MatchOutcome::Matched {
        result: CompanySector::new(row.company.clone(), row.sector.clone()),
        kind,
    }
}
