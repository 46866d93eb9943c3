//! Result table output.

use crate::input::InputRecord;
use anyhow::Context;
use sectorlens_core::{Domain, ResolutionResult, ResolutionSource, UNKNOWN};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    input: &'a str,
    domain: &'a str,
    company: &'a str,
    sector: &'a str,
    source: String,
}

/// Write one row per input record, in input order.
///
/// Records without a usable domain, or missing from `results`, are written
/// as `Unknown`.
pub fn write_results(
    path: &Path,
    records: &[InputRecord],
    results: &BTreeMap<Domain, ResolutionResult>,
) -> anyhow::Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;

    for record in records {
        let result = record.domain.as_ref().and_then(|domain| results.get(domain));
        let row = match result {
            Some(result) => OutputRow {
                input: &record.raw,
                domain: result.domain.as_str(),
                company: &result.company,
                sector: &result.sector,
                source: result.source.to_string(),
            },
            None => OutputRow {
                input: &record.raw,
                domain: record.domain.as_ref().map_or("", Domain::as_str),
                company: UNKNOWN,
                sector: UNKNOWN,
                source: ResolutionSource::Fallback.to_string(),
            },
        };
        writer.serialize(row)?;
    }

    writer.flush()?;
    Ok(records.len())
}
