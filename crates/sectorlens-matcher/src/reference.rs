//! Reference dataset of known (domain, company, sector) rows.

use crate::error::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// One known organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceRow {
    /// Lowercased domain
    #[serde(alias = "Domain")]
    pub domain: String,
    /// Company name
    #[serde(default, alias = "Company", alias = "company_name")]
    pub company: String,
    /// Sector label
    #[serde(default, alias = "Sector", alias = "industry", alias = "Industry")]
    pub sector: String,
}

impl ReferenceRow {
    /// Build a row; the domain is normalized.
    pub fn new(domain: &str, company: impl Into<String>, sector: impl Into<String>) -> Self {
        Self {
            domain: domain.trim().to_lowercase(),
            company: company.into(),
            sector: sector.into(),
        }
    }
}

/// Ordered reference rows with an exact-lookup index.
///
/// Rows keep their input order; for duplicate domains exact lookup returns
/// the first occurrence.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
    index: HashMap<String, usize>,
}

impl ReferenceTable {
    /// Build a table, dropping rows with a blank domain.
    pub fn from_rows(rows: impl IntoIterator<Item = ReferenceRow>) -> Self {
        let mut table = Self::default();
        for mut row in rows {
            row.domain = row.domain.trim().to_lowercase();
            if row.domain.is_empty() {
                continue;
            }
            table
                .index
                .entry(row.domain.clone())
                .or_insert(table.rows.len());
            table.rows.push(row);
        }
        table
    }

    /// Load a CSV file with a `domain,company,sector` header.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<ReferenceRow>() {
            match record {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!("Skipping malformed reference row: {}", e),
            }
        }

        let table = Self::from_rows(rows);
        tracing::info!(
            rows = table.len(),
            path = %path.display(),
            "Loaded reference dataset"
        );
        Ok(table)
    }

    /// Exact lookup on a lowercased domain.
    pub fn get(&self, domain: &str) -> Option<&ReferenceRow> {
        self.index.get(domain).map(|&i| &self.rows[i])
    }

    /// Rows in input order.
    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
