//! Input file parsing.

use anyhow::Context;
use sectorlens_core::Domain;
use std::path::Path;

/// One line of input and the domain extracted from it.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    /// The value as it appeared in the file
    pub raw: String,
    /// Extracted domain; `None` when the value is not a usable address
    pub domain: Option<Domain>,
}

impl InputRecord {
    fn parse(raw: &str) -> Self {
        let parsed = if raw.contains('@') {
            Domain::from_email(raw)
        } else {
            Domain::new(raw)
        };

        let domain = match parsed {
            Ok(domain) => Some(domain),
            Err(err) => {
                tracing::warn!(input = raw, error = %err, "Skipping unusable input");
                None
            }
        };

        Self {
            raw: raw.to_string(),
            domain,
        }
    }
}

/// Parse input text: one email or domain per line, first CSV column only.
///
/// Blank lines, `#` comments and an `email`/`domain` header are skipped.
pub fn parse_input(text: &str) -> Vec<InputRecord> {
    let mut records = Vec::new();

    for line in text.lines() {
        let value = line.split(',').next().unwrap_or_default().trim();
        let value = value.trim_matches('"').trim();
        if value.is_empty() || value.starts_with('#') {
            continue;
        }
        if records.is_empty()
            && (value.eq_ignore_ascii_case("email") || value.eq_ignore_ascii_case("domain"))
        {
            continue;
        }
        records.push(InputRecord::parse(value));
    }

    records
}

/// Read and parse an input file.
pub fn read_input(path: &Path) -> anyhow::Result<Vec<InputRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    Ok(parse_input(&text))
}
