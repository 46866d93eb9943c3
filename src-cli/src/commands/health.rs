//! Health check.
//!
//! Runs the registered checks (cache database, free disk space) and lists
//! breaker states. Each check gets its own status line.

use crate::state::AppState;
use sectorlens_core::AppConfig;
use sectorlens_resilience::CircuitState;
use std::fmt;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Minimum free space on the volume holding the cache.
pub const MIN_FREE_BYTES: u64 = 1024 * 1024 * 1024;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Status of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed
    Ok,
    /// Check ran and failed
    Failed,
    /// Check could not be evaluated
    Unknown,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of one named check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    /// Check name
    pub name: &'static str,
    /// Outcome
    pub status: CheckStatus,
    /// Human-readable detail
    pub detail: String,
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.status, self.detail)
    }
}

/// Everything `health` reports.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Check outcomes, in registration order
    pub checks: Vec<CheckResult>,
    /// Breaker states, default breaker first
    pub breakers: Vec<(String, CircuitState)>,
}

impl HealthReport {
    /// True unless some check failed. Unknown outcomes do not count.
    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status != CheckStatus::Failed)
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for check in &self.checks {
            writeln!(f, "{check}")?;
        }
        for (name, circuit) in &self.breakers {
            writeln!(f, "breaker {name}: {circuit}")?;
        }
        Ok(())
    }
}

/// Run every check against the configured cache.
///
/// Fails only if the cache cannot be opened at all; a cache that opens but
/// does not answer is reported as a failed check.
pub async fn run(config: &AppConfig) -> anyhow::Result<HealthReport> {
    let state = AppState::open(config).await?;
    let database_path = config.cache_database_path()?;

    let mut checks = Vec::with_capacity(2);
    checks.push(cache_database(&state).await);
    checks.push(disk_space(&database_path));

    for check in &checks {
        match check.status {
            CheckStatus::Failed => tracing::warn!(check = check.name, "{}", check.detail),
            _ => tracing::debug!(check = check.name, status = %check.status, "{}", check.detail),
        }
    }

    Ok(HealthReport {
        checks,
        breakers: state.resilience.breakers().states(),
    })
}

async fn cache_database(state: &AppState) -> CheckResult {
    let status = match state.cache.verify().await {
        Ok(()) => state.cache.count().await,
        Err(err) => Err(err),
    };
    match status {
        Ok(entries) => CheckResult {
            name: "cache_database",
            status: CheckStatus::Ok,
            detail: format!("{entries} entries"),
        },
        Err(err) => CheckResult {
            name: "cache_database",
            status: CheckStatus::Failed,
            detail: err.to_string(),
        },
    }
}

fn disk_space(path: &Path) -> CheckResult {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

    let disks = Disks::new_with_refreshed_list();
    let mounts: Vec<(PathBuf, u64)> = disks
        .list()
        .iter()
        .map(|disk| (disk.mount_point().to_path_buf(), disk.available_space()))
        .collect();

    evaluate_free_space(&dir, available_for(&dir, &mounts), MIN_FREE_BYTES)
}

/// Free bytes on the most specific mount containing `path`.
fn available_for(path: &Path, mounts: &[(PathBuf, u64)]) -> Option<u64> {
    mounts
        .iter()
        .filter(|(mount, _)| path.starts_with(mount))
        .max_by_key(|(mount, _)| mount.components().count())
        .map(|(_, free)| *free)
}

#[allow(clippy::cast_precision_loss)]
fn evaluate_free_space(dir: &Path, free: Option<u64>, minimum: u64) -> CheckResult {
    match free {
        Some(free) => CheckResult {
            name: "disk_space",
            status: if free >= minimum {
                CheckStatus::Ok
            } else {
                CheckStatus::Failed
            },
            detail: format!("{:.1} GB free at {}", free as f64 / GIB, dir.display()),
        },
        None => CheckResult {
            name: "disk_space",
            status: CheckStatus::Unknown,
            detail: format!("no mounted volume found for {}", dir.display()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_health_reports_each_check_and_default_breaker() {
        let tmp = TempDir::new().expect("create temp dir");
        let mut config = AppConfig::default();
        config.cache.database_path = Some(tmp.path().join("cache.db"));
        config.cache.mirror_path = Some(tmp.path().join("search_cache.csv"));

        let report = run(&config).await.expect("healthy");
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.checks[0].name, "cache_database");
        assert_eq!(report.checks[0].status, CheckStatus::Ok);
        assert_eq!(report.checks[1].name, "disk_space");

        let text = report.to_string();
        assert!(text.starts_with("cache_database: ok (0 entries)"));
        assert!(text.contains("\ndisk_space: "));
        assert!(text.contains("breaker default"));
    }

    #[test]
    fn test_available_for_picks_most_specific_mount() {
        let mounts = vec![
            (PathBuf::from("/"), 10),
            (PathBuf::from("/data"), 20),
            (PathBuf::from("/data/cache"), 30),
        ];
        assert_eq!(available_for(Path::new("/data/cache/db"), &mounts), Some(30));
        assert_eq!(available_for(Path::new("/data/other"), &mounts), Some(20));
        assert_eq!(available_for(Path::new("/home/me"), &mounts), Some(10));
        assert_eq!(available_for(Path::new("/home/me"), &mounts[1..]), None);
    }

    #[test]
    fn test_low_disk_space_fails_the_report() {
        let dir = Path::new("/data");
        let low = evaluate_free_space(dir, Some(MIN_FREE_BYTES - 1), MIN_FREE_BYTES);
        assert_eq!(low.status, CheckStatus::Failed);

        let plenty = evaluate_free_space(dir, Some(2 * MIN_FREE_BYTES), MIN_FREE_BYTES);
        assert_eq!(plenty.status, CheckStatus::Ok);
        assert_eq!(plenty.to_string(), "disk_space: ok (2.0 GB free at /data)");

        let unknown = evaluate_free_space(dir, None, MIN_FREE_BYTES);
        assert_eq!(unknown.status, CheckStatus::Unknown);

        let mut report = HealthReport {
            checks: vec![plenty, unknown],
            breakers: Vec::new(),
        };
        assert!(report.is_healthy());
        report.checks.push(low);
        assert!(!report.is_healthy());
    }
}
