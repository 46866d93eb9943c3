//! Shared types used across SectorLens.
//!
//! This module defines the domain newtype and the value types that flow
//! between the cache, the local matcher, the web resolver and the orchestrator.

use crate::error::SectorlensError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Placeholder used when a company or sector could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Last-resort sector for the web path, which never reports [`UNKNOWN`].
pub const BUSINESS_SERVICES: &str = "Business Services";

/// Two-level public suffixes recognised when reducing a host to its registrable name.
const TWO_LEVEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.nz", "co.jp", "co.in",
    "com.br", "co.za", "com.mx", "com.sg",
];

/// Normalized lowercase domain.
///
/// Either a full host (`acme.com`) or the registrable name taken from an
/// email address (`acme`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Normalize and validate a raw domain string.
    ///
    /// Trims whitespace, lowercases, strips a leading `www.` and trailing dots.
    ///
    /// # Errors
    /// Returns error if the result is empty or contains characters that
    /// cannot appear in a host name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, SectorlensError> {
        let raw = raw.as_ref();
        let mut value = raw.trim().to_lowercase();
        while value.ends_with('.') {
            value.pop();
        }
        if let Some(stripped) = value.strip_prefix("www.") {
            value = stripped.to_string();
        }

        Self::validate(raw, &value)?;
        Ok(Self(value))
    }

    /// Extract the registrable name from an email address.
    ///
    /// `user@mail.acme.co.uk` becomes `acme`.
    ///
    /// # Errors
    /// Returns error if the address has no host part or the host is invalid.
    pub fn from_email(email: &str) -> Result<Self, SectorlensError> {
        let host = email
            .trim()
            .rsplit_once('@')
            .map(|(_, host)| host)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| SectorlensError::InvalidDomain {
                input: email.to_string(),
                reason: "missing host part".to_string(),
            })?;

        let host = Self::new(host)?;
        Ok(Self(registrable_name(host.as_str()).to_string()))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First label of the domain (`acme` for `acme.com`).
    #[must_use]
    pub fn label(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Whether the domain carries a TLD.
    #[must_use]
    pub fn has_tld(&self) -> bool {
        self.0.contains('.')
    }

    fn validate(raw: &str, value: &str) -> Result<(), SectorlensError> {
        static HOST_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = HOST_REGEX.get_or_init(|| {
            Regex::new(r"^[a-z0-9_]([a-z0-9_.-]*[a-z0-9_])?$").expect("valid regex")
        });

        if value.is_empty() {
            return Err(SectorlensError::InvalidDomain {
                input: raw.to_string(),
                reason: "empty".to_string(),
            });
        }

        if regex.is_match(value) && !value.contains("..") {
            Ok(())
        } else {
            Err(SectorlensError::InvalidDomain {
                input: raw.to_string(),
                reason: "must contain only letters, digits, dots, hyphens and underscores"
                    .to_string(),
            })
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn registrable_name(host: &str) -> &str {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return host;
    }

    let suffix_len = if labels.len() >= 3 {
        let last_two = format!("{}.{}", labels[labels.len() - 2], labels[labels.len() - 1]);
        if TWO_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
            2
        } else {
            1
        }
    } else {
        1
    };

    labels[labels.len() - suffix_len - 1]
}

/// A resolved (company, sector) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySector {
    /// Display name of the organization
    pub company: String,
    /// Business sector label
    pub sector: String,
}

impl CompanySector {
    /// Create a new pair.
    #[must_use]
    pub fn new(company: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            company: company.into(),
            sector: sector.into(),
        }
    }

    /// The `("Unknown", "Unknown")` placeholder.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }

    /// Whether the sector is the [`UNKNOWN`] placeholder.
    #[must_use]
    pub fn has_unknown_sector(&self) -> bool {
        self.sector == UNKNOWN
    }
}

/// How much a cached value can be trusted.
///
/// A cached `Unknown` sector means "searched and found nothing", which is a
/// weak hit: it is kept, but callers re-attempt resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// A real sector was resolved
    Strong,
    /// Placeholder entry; resolution should be retried
    Weak,
}

impl Confidence {
    /// Derive the confidence of a stored sector.
    #[must_use]
    pub fn for_sector(sector: &str) -> Self {
        if sector.trim().is_empty() || sector == UNKNOWN {
            Self::Weak
        } else {
            Self::Strong
        }
    }

    /// Database representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strong => "strong",
            Self::Weak => "weak",
        }
    }

    /// Parse the database representation, treating anything unrecognised as weak.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "strong" {
            Self::Strong
        } else {
            Self::Weak
        }
    }
}

/// Where a resolution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Matched against the local reference dataset
    LocalMatch,
    /// Resolved through web search
    WebSearch,
    /// Synthesized or placeholder value
    Fallback,
    /// Served from the persistent cache
    Cache,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LocalMatch => "local_match",
            Self::WebSearch => "web_search",
            Self::Fallback => "fallback",
            Self::Cache => "cache",
        };
        write!(f, "{s}")
    }
}

/// Final answer for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// Domain that was resolved
    pub domain: Domain,
    /// Company display name
    pub company: String,
    /// Sector label
    pub sector: String,
    /// Provenance of the answer
    pub source: ResolutionSource,
}

impl ResolutionResult {
    /// Build a result from a resolved pair.
    #[must_use]
    pub fn new(domain: Domain, value: CompanySector, source: ResolutionSource) -> Self {
        Self {
            domain,
            company: value.company,
            sector: value.sector,
            source,
        }
    }

    /// The `("Unknown", "Unknown")` fallback for a domain.
    #[must_use]
    pub fn unknown(domain: Domain) -> Self {
        Self::new(domain, CompanySector::unknown(), ResolutionSource::Fallback)
    }
}
