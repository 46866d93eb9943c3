//! CSV flat-file mirror of the cache.
//!
//! The mirror is an append-only `domain,company,sector` file kept for
//! portability and for bootstrapping an empty database. It may accumulate
//! duplicate domains; [`FlatFileMirror::dedup`] rewrites it keeping the
//! first occurrence of each.

use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const HEADER: [&str; 3] = ["domain", "company", "sector"];

/// One mirror row. Missing columns read as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRow {
    /// Domain key
    pub domain: String,
    /// Company name
    #[serde(default)]
    pub company: String,
    /// Sector label
    #[serde(default)]
    pub sector: String,
}

impl MirrorRow {
    /// Build a row.
    pub fn new(
        domain: impl Into<String>,
        company: impl Into<String>,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            company: company.into(),
            sector: sector.into(),
        }
    }
}

/// Result of [`FlatFileMirror::dedup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupOutcome {
    /// Rows left after deduplication
    pub remaining: usize,
    /// Copy of the file taken before rewriting
    pub backup: Option<PathBuf>,
}

/// Handle on the CSV mirror file.
#[derive(Debug)]
pub struct FlatFileMirror {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FlatFileMirror {
    /// Create a handle; the file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the mirror file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, writing the header first if the file is new or empty.
    pub fn append(&self, row: &MirrorRow) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let needs_header = fs::metadata(&self.path).map_or(true, |m| m.len() == 0);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record([&row.domain, &row.company, &row.sector])?;
        writer.flush()?;
        Ok(())
    }

    /// Read every row in file order. A missing file reads as empty.
    pub fn read_rows(&self) -> Result<Vec<MirrorRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<MirrorRow>() {
            match record {
                Ok(mut row) => {
                    row.domain = row.domain.to_lowercase();
                    if !row.domain.is_empty() {
                        rows.push(row);
                    }
                }
                Err(e) => tracing::warn!("Skipping malformed mirror row: {}", e),
            }
        }
        Ok(rows)
    }

    /// First row for `domain`, if any.
    pub fn find(&self, domain: &str) -> Result<Option<MirrorRow>> {
        Ok(self.read_rows()?.into_iter().find(|row| row.domain == domain))
    }

    /// Rewrite the file keeping the first occurrence of each domain.
    ///
    /// A timestamped copy (`<file>.bak.<YYYYmmddTHHMMSS.ffffffZ>`) is written
    /// before the original is touched. Read, backup and rewrite all happen
    /// under the append lock.
    pub fn dedup(&self) -> Result<DedupOutcome> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if !self.path.exists() {
            return Ok(DedupOutcome {
                remaining: 0,
                backup: None,
            });
        }

        let rows = self.read_rows()?;
        let backup = self.backup_path();
        fs::copy(&self.path, &backup)?;

        let mut seen = HashSet::new();
        let unique: Vec<&MirrorRow> = rows
            .iter()
            .filter(|row| seen.insert(row.domain.clone()))
            .collect();

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        writer.write_record(HEADER)?;
        for row in &unique {
            writer.write_record([&row.domain, &row.company, &row.sector])?;
        }
        writer.flush()?;

        tracing::info!(
            before = rows.len(),
            after = unique.len(),
            backup = %backup.display(),
            "Deduplicated cache mirror"
        );

        Ok(DedupOutcome {
            remaining: unique.len(),
            backup: Some(backup),
        })
    }

    /// Fresh backup name; a counter suffix breaks ties within one stamp.
    fn backup_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let mut base = self.path.as_os_str().to_os_string();
        base.push(format!(".bak.{stamp}"));

        let mut candidate = PathBuf::from(&base);
        let mut counter = 1;
        while candidate.exists() {
            let mut name = base.clone();
            name.push(format!("-{counter}"));
            candidate = PathBuf::from(name);
            counter += 1;
        }
        candidate
    }
}
