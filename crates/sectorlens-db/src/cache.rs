//! Domain → (company, sector) cache.
//!
//! The `SQLite` table is the source of truth. The CSV mirror is written to
//! only when a domain is stored for the first time and is read only when the
//! table is empty.

use crate::error::Result;
use crate::mirror::{DedupOutcome, FlatFileMirror, MirrorRow};
use crate::Database;
use chrono::Utc;
use sectorlens_core::{CompanySector, Confidence, Domain, UNKNOWN};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// A cached resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Normalized domain
    pub domain: String,
    /// Company name
    pub company: String,
    /// Sector label
    pub sector: String,
    /// Whether the sector is a real answer or the Unknown placeholder
    pub confidence: Confidence,
    /// Unix timestamp of the last write, 0 for mirror-only rows
    pub last_seen: i64,
}

impl CacheEntry {
    /// Whether this entry is a weak hit that should be re-resolved.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.confidence == Confidence::Weak
    }

    /// The cached pair.
    #[must_use]
    pub fn value(&self) -> CompanySector {
        CompanySector::new(self.company.clone(), self.sector.clone())
    }

    fn from_mirror(row: MirrorRow) -> Self {
        let company = non_empty_or_unknown(row.company);
        let sector = non_empty_or_unknown(row.sector);
        Self {
            confidence: Confidence::for_sector(&sector),
            domain: row.domain,
            company,
            sector,
            last_seen: 0,
        }
    }
}

type CacheRow = (String, String, String, String, i64);

fn entry_from_row((domain, company, sector, confidence, last_seen): CacheRow) -> CacheEntry {
    CacheEntry {
        domain,
        company,
        sector,
        confidence: Confidence::parse(&confidence),
        last_seen,
    }
}

fn non_empty_or_unknown(value: String) -> String {
    if value.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        value
    }
}

/// Persistent cache: `SQLite` primary store plus CSV mirror.
#[derive(Debug)]
pub struct CacheStore {
    db: Database,
    mirror: FlatFileMirror,
    write_lock: Mutex<()>,
}

impl CacheStore {
    /// Wrap an already migrated database and a mirror.
    pub fn new(db: Database, mirror: FlatFileMirror) -> Self {
        Self {
            db,
            mirror,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The CSV mirror.
    pub fn mirror(&self) -> &FlatFileMirror {
        &self.mirror
    }

    /// Check the primary store is reachable.
    pub async fn verify(&self) -> Result<()> {
        self.db.verify().await
    }

    /// Look up a domain.
    ///
    /// Falls back to the mirror only while the primary store is empty.
    pub async fn get(&self, domain: &Domain) -> Result<Option<CacheEntry>> {
        if let Some(entry) = self.get_primary(domain.as_str()).await? {
            return Ok(Some(entry));
        }

        if self.count().await? == 0 {
            if let Some(row) = self.mirror.find(domain.as_str())? {
                tracing::debug!(domain = %domain, "Cache hit from mirror (primary store empty)");
                return Ok(Some(CacheEntry::from_mirror(row)));
            }
        }
        Ok(None)
    }

    /// Store a resolution, replacing any previous entry for the domain.
    ///
    /// The mirror gets a row only if the domain was not in the primary store
    /// before this write.
    pub async fn put(&self, domain: &Domain, company: &str, sector: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let existed = self.get_primary(domain.as_str()).await?.is_some();
        let confidence = Confidence::for_sector(sector);

        sqlx::query(
            "INSERT INTO cache (domain, company, sector, confidence, last_seen)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(domain) DO UPDATE SET
                 company = excluded.company,
                 sector = excluded.sector,
                 confidence = excluded.confidence,
                 last_seen = excluded.last_seen",
        )
        .bind(domain.as_str())
        .bind(company)
        .bind(sector)
        .bind(confidence.as_str())
        .bind(Utc::now().timestamp())
        .execute(self.db.pool())
        .await?;

        if !existed {
            self.mirror
                .append(&MirrorRow::new(domain.as_str(), company, sector))?;
        }

        tracing::debug!(domain = %domain, company, sector, "Cached resolution");
        Ok(())
    }

    /// Number of entries in the primary store.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cache")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Every entry keyed by domain, from the mirror if the primary store is empty.
    pub async fn snapshot(&self) -> Result<BTreeMap<String, CacheEntry>> {
        let rows = sqlx::query_as::<_, CacheRow>(
            "SELECT domain, company, sector, confidence, last_seen FROM cache ORDER BY domain",
        )
        .fetch_all(self.db.pool())
        .await?;

        if !rows.is_empty() {
            return Ok(rows
                .into_iter()
                .map(entry_from_row)
                .map(|e| (e.domain.clone(), e))
                .collect());
        }

        let mut entries = BTreeMap::new();
        for row in self.mirror.read_rows()? {
            entries
                .entry(row.domain.clone())
                .or_insert_with(|| CacheEntry::from_mirror(row));
        }
        Ok(entries)
    }

    /// Bulk-load rows into the primary store. Returns the number imported.
    ///
    /// Later rows for the same domain replace earlier ones. The mirror is
    /// not touched.
    pub async fn import_from(&self, rows: impl IntoIterator<Item = MirrorRow>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now().timestamp();
        let mut tx = self.db.pool().begin().await?;
        let mut imported = 0;

        for row in rows {
            let domain = row.domain.trim().to_lowercase();
            if domain.is_empty() {
                continue;
            }
            let company = non_empty_or_unknown(row.company);
            let sector = non_empty_or_unknown(row.sector);

            sqlx::query(
                "INSERT OR REPLACE INTO cache (domain, company, sector, confidence, last_seen)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&domain)
            .bind(&company)
            .bind(&sector)
            .bind(Confidence::for_sector(&sector).as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
            imported += 1;
        }

        tx.commit().await?;
        tracing::info!(imported, "Imported rows into cache");
        Ok(imported)
    }

    /// Load the whole mirror into the primary store.
    pub async fn import_mirror(&self) -> Result<usize> {
        let rows = self.mirror.read_rows()?;
        self.import_from(rows).await
    }

    /// Deduplicate the mirror file.
    pub async fn dedup_mirror(&self) -> Result<DedupOutcome> {
        let _guard = self.write_lock.lock().await;
        self.mirror.dedup()
    }

    async fn get_primary(&self, domain: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query_as::<_, CacheRow>(
            "SELECT domain, company, sector, confidence, last_seen FROM cache WHERE domain = ?",
        )
        .bind(domain)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(entry_from_row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    async fn store(tmp: &TempDir) -> CacheStore {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");
        CacheStore::new(db, FlatFileMirror::new(tmp.path().join("cache.csv")))
    }

    fn domain(s: &str) -> Domain {
        Domain::new(s).expect("valid domain")
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = store(&tmp).await;

        assert!(store.get(&domain("acme.com")).await.expect("get").is_none());

        store
            .put(&domain("acme.com"), "Acme", "Retail")
            .await
            .expect("put");
        let entry = store
            .get(&domain("acme.com"))
            .await
            .expect("get")
            .expect("entry exists");
        assert_eq!(entry.company, "Acme");
        assert_eq!(entry.sector, "Retail");
        assert_eq!(entry.confidence, Confidence::Strong);
        assert!(entry.last_seen > 0);
    }

    #[tokio::test]
    async fn test_put_replaces_and_mirrors_once() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = store(&tmp).await;
        let acme = domain("acme.com");

        store.put(&acme, "Acme", UNKNOWN).await.expect("first put");
        store.put(&acme, "Acme Corp", "Retail").await.expect("second put");

        let entry = store.get(&acme).await.expect("get").expect("entry");
        assert_eq!(entry.company, "Acme Corp");
        assert_eq!(entry.sector, "Retail");
        assert_eq!(store.count().await.expect("count"), 1);

        let rows = store.mirror().read_rows().expect("read mirror");
        assert_eq!(rows, vec![MirrorRow::new("acme.com", "Acme", UNKNOWN)]);
    }

    #[tokio::test]
    async fn test_unknown_sector_is_weak() {
        let tmp = TempDir::new().expect("create temp dir");
        let store = store(&tmp).await;

        store
            .put(&domain("mystery.com"), "Mystery", UNKNOWN)
            .await
            .expect("put");
        let entry = store
            .get(&domain("mystery.com"))
            .await
            .expect("get")
            .expect("entry");
        assert!(entry.is_weak());
    }

    #[tokio::test]
    async fn test_mirror_bootstrap_when_primary_empty() {
        let tmp = TempDir::new().expect("create temp dir");
        fs::write(
            tmp.path().join("cache.csv"),
            "domain,company,sector\nlegacy.com,Legacy,Finance\n",
        )
        .expect("write mirror");
        let store = store(&tmp).await;

        let entry = store
            .get(&domain("legacy.com"))
            .await
            .expect("get")
            .expect("mirror entry");
        assert_eq!(entry.company, "Legacy");
        assert_eq!(entry.last_seen, 0);

        // Once the primary store has data, the mirror is no longer consulted
        store
            .put(&domain("fresh.com"), "Fresh", "Retail")
            .await
            .expect("put");
        assert!(store.get(&domain("legacy.com")).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn test_import_mirror() {
        let tmp = TempDir::new().expect("create temp dir");
        fs::write(
            tmp.path().join("cache.csv"),
            "domain,company,sector\na.com,A,Retail\nb.com,,\nA.com,A2,Finance\n",
        )
        .expect("write mirror");
        let store = store(&tmp).await;

        let imported = store.import_mirror().await.expect("import");
        assert_eq!(imported, 3);
        assert_eq!(store.count().await.expect("count"), 2);

        let snapshot = store.snapshot().await.expect("snapshot");
        assert_eq!(snapshot["a.com"].company, "A2");
        assert_eq!(snapshot["b.com"].company, UNKNOWN);
        assert!(snapshot["b.com"].is_weak());
    }

    #[tokio::test]
    async fn test_snapshot_falls_back_to_mirror() {
        let tmp = TempDir::new().expect("create temp dir");
        fs::write(
            tmp.path().join("cache.csv"),
            "domain,company,sector\nx.com,First,Retail\nx.com,Second,Finance\n",
        )
        .expect("write mirror");
        let store = store(&tmp).await;

        let snapshot = store.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["x.com"].company, "First");
    }
}
