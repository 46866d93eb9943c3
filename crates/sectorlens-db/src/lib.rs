//! SectorLens cache store.
//!
//! A `SQLite` primary store accessed through `SQLx`, with embedded
//! migrations, plus a CSV flat-file mirror kept for portability.
//!
//! # Example
//!
//! ```ignore
//! use sectorlens_core::Domain;
//! use sectorlens_db::{CacheStore, Database, FlatFileMirror};
//!
//! let db = Database::new("search_cache.db").await?;
//! db.run_migrations().await?;
//! let cache = CacheStore::new(db, FlatFileMirror::new("search_cache.csv"));
//!
//! cache.put(&Domain::new("acme.com")?, "Acme", "Retail").await?;
//! ```
//!
//! # Design Principles
//!
//! - The database is the source of truth; the mirror is append-only
//! - One row per domain, replaced on every write
//! - An `Unknown` sector is stored with weak confidence so it can be retried

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod cache;
pub mod connection;
pub mod error;
pub mod migrations;
pub mod mirror;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheStore};
pub use connection::CachePool;
pub use error::{DatabaseError, Result};
pub use mirror::{DedupOutcome, FlatFileMirror, MirrorRow};

use std::path::Path;

/// High-level database handle.
#[derive(Debug)]
pub struct Database {
    pool: CachePool,
}

impl Database {
    /// Open (or create) the database at `path`; `:memory:` for in-memory.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = CachePool::new(path).await?;
        Ok(Self { pool })
    }

    /// Open the database and bring the schema up to date.
    pub async fn open_migrated(path: impl AsRef<Path>) -> Result<Self> {
        let db = Self::new(path).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(self.pool.pool()).await
    }

    /// Get the current schema version.
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(self.pool.pool()).await
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Sqlite> {
        self.pool.pool()
    }

    /// Check the database answers queries.
    pub async fn verify(&self) -> Result<()> {
        self.pool.verify().await
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
