//! Shared components for a command run.

use anyhow::Context;
use sectorlens_core::AppConfig;
use sectorlens_db::{CacheStore, Database, FlatFileMirror};
use sectorlens_resilience::Resilience;
use std::sync::Arc;

/// Components shared by every command.
pub struct AppState {
    /// Persistent cache (SQLite plus CSV mirror)
    pub cache: Arc<CacheStore>,
    /// Rate limiter, breakers and metrics
    pub resilience: Arc<Resilience>,
}

impl AppState {
    /// Open the cache at the configured paths and build a fresh substrate.
    pub async fn open(config: &AppConfig) -> anyhow::Result<Self> {
        let database_path = config
            .cache_database_path()
            .context("failed to determine cache database path")?;
        let mirror_path = config
            .cache_mirror_path()
            .context("failed to determine cache mirror path")?;

        tracing::info!("Cache database: {}", database_path.display());

        let db = Database::open_migrated(&database_path)
            .await
            .with_context(|| format!("failed to open cache at {}", database_path.display()))?;

        Ok(Self {
            cache: Arc::new(CacheStore::new(db, FlatFileMirror::new(mirror_path))),
            resilience: Arc::new(Resilience::new(
                config.resilience.default_breaker.clone(),
            )),
        })
    }
}
