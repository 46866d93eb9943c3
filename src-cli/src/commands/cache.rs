//! Cache maintenance commands.

use crate::state::AppState;
use anyhow::Context;
use sectorlens_core::AppConfig;
use sectorlens_db::{DedupOutcome, FlatFileMirror};

/// Bulk-load the CSV mirror into the cache database.
pub async fn migrate(config: &AppConfig) -> anyhow::Result<usize> {
    let state = AppState::open(config).await?;
    let imported = state
        .cache
        .import_mirror()
        .await
        .context("failed to import the cache mirror")?;
    Ok(imported)
}

/// Rewrite the CSV mirror without duplicate domains, keeping a backup.
///
/// Works on the file alone; the database is not opened.
pub fn clean_mirror(config: &AppConfig) -> anyhow::Result<DedupOutcome> {
    let path = config
        .cache_mirror_path()
        .context("failed to determine cache mirror path")?;
    FlatFileMirror::new(&path)
        .dedup()
        .with_context(|| format!("failed to deduplicate {}", path.display()))
}
