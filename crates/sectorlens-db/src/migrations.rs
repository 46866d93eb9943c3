//! Cache schema migrations.
//!
//! The schema is a single `cache` table keyed by normalized domain:
//!
//! | column       | type    | notes                                        |
//! |--------------|---------|----------------------------------------------|
//! | `domain`     | TEXT    | primary key, lowercase registrable label     |
//! | `company`    | TEXT    | resolved company name                        |
//! | `sector`     | TEXT    | resolved sector, stored as given             |
//! | `confidence` | TEXT    | `strong`, or `weak` for an `Unknown` sector  |
//! | `last_seen`  | INTEGER | Unix seconds of the most recent write        |
//!
//! plus an index on `confidence`. The SQL lives under `migrations/` and is
//! embedded at compile time.

use crate::error::{DatabaseError, Result};
use sqlx::{Pool, Sqlite};

/// Bring the `cache` table up to the latest schema.
///
/// Already-applied scripts are skipped, so this runs on every open.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    tracing::debug!("Applying cache schema migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("cache schema migration failed: {e}")))?;

    tracing::info!("Cache schema is up to date");
    Ok(())
}

/// Version of the newest applied cache schema script, 0 on a fresh file.
pub async fn get_schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let tracked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::CachePool;

    const INSERT_ACME: &str = "INSERT INTO cache (domain, company, sector, last_seen) \
                               VALUES ('acme', 'Acme', 'Retail', 0)";

    async fn migrated() -> CachePool {
        let pool = CachePool::new(":memory:").await.expect("create pool");
        run_migrations(pool.pool()).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn test_cache_table_columns() {
        let pool = migrated().await;

        let columns: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT name, type, pk FROM pragma_table_info('cache') ORDER BY cid")
                .fetch_all(pool.pool())
                .await
                .expect("table info");

        let expected = [
            ("domain", "TEXT", 1),
            ("company", "TEXT", 0),
            ("sector", "TEXT", 0),
            ("confidence", "TEXT", 0),
            ("last_seen", "INTEGER", 0),
        ];
        assert_eq!(columns.len(), expected.len());
        for ((name, ty, pk), (want_name, want_ty, want_pk)) in columns.iter().zip(expected) {
            assert_eq!(name, want_name);
            assert_eq!(ty, want_ty);
            assert_eq!(*pk, want_pk);
        }
    }

    #[tokio::test]
    async fn test_confidence_is_constrained() {
        let pool = migrated().await;

        sqlx::query(INSERT_ACME)
            .execute(pool.pool())
            .await
            .expect("default confidence");
        let confidence: String =
            sqlx::query_scalar("SELECT confidence FROM cache WHERE domain = 'acme'")
                .fetch_one(pool.pool())
                .await
                .expect("read back");
        assert_eq!(confidence, "strong");

        let rejected = sqlx::query(
            "INSERT INTO cache (domain, company, sector, confidence, last_seen) \
             VALUES ('globex', 'Globex', 'Energy', 'maybe', 0)",
        )
        .execute(pool.pool())
        .await;
        assert!(rejected.is_err());
    }

    #[tokio::test]
    async fn test_reapplying_keeps_version_and_rows() {
        let pool = CachePool::new(":memory:").await.expect("create pool");
        assert_eq!(get_schema_version(pool.pool()).await.expect("version"), 0);

        run_migrations(pool.pool()).await.expect("first run");
        sqlx::query(INSERT_ACME)
            .execute(pool.pool())
            .await
            .expect("insert");
        run_migrations(pool.pool()).await.expect("second run");

        assert_eq!(get_schema_version(pool.pool()).await.expect("version"), 1);
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache")
            .fetch_one(pool.pool())
            .await
            .expect("count");
        assert_eq!(rows, 1);
    }
}
