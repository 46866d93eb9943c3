//! Configuration management for SectorLens.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/sectorlens/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Orchestrator and local matcher settings
    pub resolver: ResolverConfig,
    /// Retry and circuit breaker policies
    pub resilience: ResilienceConfig,
    /// Web resolver settings
    pub web: WebConfig,
    /// Cache store locations
    pub cache: CacheConfig,
    /// Metrics export and alert thresholds
    pub monitoring: MonitoringConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SECTORLENS_WORKERS`: Override the number of concurrent resolutions
    /// - `SECTORLENS_MIN_DELAY_MS`: Override the per-host minimum delay
    /// - `SECTORLENS_USE_WEB`: Enable or disable the web fallback (true/false)
    /// - `SECTORLENS_KNOWLEDGE_GRAPH`: Enable or disable the knowledge graph lookup (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides to an already loaded configuration.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("SECTORLENS_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.resolver.workers = workers;
                tracing::debug!("Override resolver.workers from env: {}", workers);
            }
        }

        if let Ok(val) = std::env::var("SECTORLENS_MIN_DELAY_MS") {
            if let Ok(delay) = val.parse() {
                self.resolver.min_delay_ms = delay;
                tracing::debug!("Override resolver.min_delay_ms from env: {}", delay);
            }
        }

        if let Ok(val) = std::env::var("SECTORLENS_USE_WEB") {
            if let Ok(enabled) = val.parse() {
                self.resolver.use_web = enabled;
                tracing::debug!("Override resolver.use_web from env: {}", enabled);
            }
        }

        if let Ok(val) = std::env::var("SECTORLENS_KNOWLEDGE_GRAPH") {
            if let Ok(enabled) = val.parse() {
                self.web.knowledge_graph = enabled;
                tracing::debug!("Override web.knowledge_graph from env: {}", enabled);
            }
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolver.workers == 0 {
            return Err(invalid("resolver.workers", "must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.resolver.fuzzy_threshold) {
            return Err(invalid("resolver.fuzzy_threshold", "must be between 0 and 100"));
        }
        if self.web.max_queries == 0 {
            return Err(invalid("web.max_queries", "must be at least 1"));
        }

        let r = &self.resilience;
        r.default_retry.validate("resilience.default_retry")?;
        r.web_search_retry.validate("resilience.web_search_retry")?;
        r.homepage_retry.validate("resilience.homepage_retry")?;
        r.default_breaker.validate("resilience.default_breaker")?;
        r.web_search_breaker.validate("resilience.web_search_breaker")?;
        r.homepage_breaker.validate("resilience.homepage_breaker")?;
        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| invalid("config_path", "no parent directory"))?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/sectorlens/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/sectorlens`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    /// Path of the primary cache database, defaulting to the data directory.
    pub fn cache_database_path(&self) -> ConfigResult<PathBuf> {
        match &self.cache.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("search_cache.db")),
        }
    }

    /// Path of the flat-file cache mirror, defaulting to the data directory.
    pub fn cache_mirror_path(&self) -> ConfigResult<PathBuf> {
        match &self.cache.mirror_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("search_cache.csv")),
        }
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "sectorlens", "sectorlens").ok_or(ConfigError::NoConfigDir)
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Orchestrator and local matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of domains resolved concurrently
    pub workers: usize,
    /// Minimum delay between requests to the same host, in milliseconds
    pub min_delay_ms: u64,
    /// Whether unresolved domains go to the web resolver
    pub use_web: bool,
    /// Minimum fuzzy score (0-100) accepted by the local matcher
    pub fuzzy_threshold: f64,
}

impl ResolverConfig {
    /// Per-host minimum delay as a [`Duration`].
    #[must_use]
    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            min_delay_ms: 500,
            use_web: true,
            fuzzy_threshold: 65.0,
        }
    }
}

/// Retry policy: exponential backoff with optional jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Base delay in seconds
    pub base_delay_secs: f64,
    /// Upper bound on any single delay, in seconds
    pub max_delay_secs: f64,
    /// Growth factor per attempt
    pub multiplier: f64,
    /// Scale each delay by a random factor in `[0.5, 1.0)`
    pub jitter: bool,
}

impl RetryPolicy {
    /// Create a policy with jitter enabled.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay_secs: f64,
        max_delay_secs: f64,
        multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            base_delay_secs,
            max_delay_secs,
            multiplier,
            jitter: true,
        }
    }

    /// Enable or disable jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Policy for web search requests.
    #[must_use]
    pub fn web_search() -> Self {
        Self::new(2, 1.0, 5.0, 2.0)
    }

    /// Policy for homepage fetches.
    #[must_use]
    pub fn homepage() -> Self {
        Self::new(2, 0.5, 3.0, 1.5)
    }

    /// Base delay as a [`Duration`].
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay_secs.max(0.0))
    }

    /// Maximum delay as a [`Duration`].
    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_secs.max(0.0))
    }

    /// Check the policy invariants.
    pub fn validate(&self, field: &str) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(invalid(field, "max_attempts must be at least 1"));
        }
        if self.base_delay_secs.is_nan() || self.base_delay_secs <= 0.0 {
            return Err(invalid(field, "base_delay_secs must be positive"));
        }
        if self.max_delay_secs.is_nan() || self.max_delay_secs < self.base_delay_secs {
            return Err(invalid(field, "max_delay_secs must be >= base_delay_secs"));
        }
        if self.multiplier.is_nan() || self.multiplier <= 1.0 {
            return Err(invalid(field, "multiplier must be greater than 1"));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1.0, 60.0, 2.0)
    }
}

/// Circuit breaker policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerPolicy {
    /// Consecutive failures (net of successes) before opening
    pub failure_threshold: u32,
    /// Seconds to stay open before allowing trial calls
    pub recovery_timeout_secs: f64,
    /// Half-open successes required to close again
    pub success_threshold: u32,
}

impl BreakerPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(failure_threshold: u32, recovery_timeout_secs: f64, success_threshold: u32) -> Self {
        Self {
            failure_threshold,
            recovery_timeout_secs,
            success_threshold,
        }
    }

    /// Policy for web search and per-domain homepage breakers.
    #[must_use]
    pub fn web() -> Self {
        Self::new(3, 30.0, 2)
    }

    /// Recovery timeout as a [`Duration`].
    #[must_use]
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.recovery_timeout_secs.max(0.0))
    }

    /// Check the policy invariants.
    pub fn validate(&self, field: &str) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(invalid(field, "failure_threshold must be at least 1"));
        }
        if self.success_threshold == 0 {
            return Err(invalid(field, "success_threshold must be at least 1"));
        }
        if self.recovery_timeout_secs.is_nan() || self.recovery_timeout_secs < 0.0 {
            return Err(invalid(field, "recovery_timeout_secs must not be negative"));
        }
        Ok(())
    }
}

impl Default for BreakerPolicy {
    fn default() -> Self {
        Self::new(5, 60.0, 2)
    }
}

/// Retry and circuit breaker policies, one set per call path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Generic path (whole web resolution of one domain)
    pub default_retry: RetryPolicy,
    /// Search engine requests
    pub web_search_retry: RetryPolicy,
    /// Homepage fetches
    pub homepage_retry: RetryPolicy,
    /// Default breaker shared by the generic path
    pub default_breaker: BreakerPolicy,
    /// Breaker guarding the search engine
    pub web_search_breaker: BreakerPolicy,
    /// Policy for the per-domain homepage breakers
    pub homepage_breaker: BreakerPolicy,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            default_retry: RetryPolicy::default(),
            web_search_retry: RetryPolicy::web_search(),
            homepage_retry: RetryPolicy::homepage(),
            default_breaker: BreakerPolicy::default(),
            web_search_breaker: BreakerPolicy::web(),
            homepage_breaker: BreakerPolicy::web(),
        }
    }
}

/// Web resolver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum identity queries issued per domain
    pub max_queries: usize,
    /// Maximum results kept per query
    pub max_results: usize,
    /// Query the knowledge graph when heuristics fail
    pub knowledge_graph: bool,
}

impl WebConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_queries: 4,
            max_results: 5,
            knowledge_graph: true,
        }
    }
}

/// Cache store locations. Unset paths live in the data directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite database path
    pub database_path: Option<PathBuf>,
    /// CSV mirror path
    pub mirror_path: Option<PathBuf>,
}

/// Metrics export and alert thresholds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Where to write the metrics snapshot, if anywhere
    pub metrics_path: Option<PathBuf>,
    /// Alert thresholds evaluated at the end of a run
    pub alerts: AlertThresholds,
}

/// Thresholds for end-of-run alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Failure rate percentage above which to alert
    pub error_rate_percent: f64,
    /// Average response time in seconds above which to alert
    pub response_time_secs: f64,
    /// Circuit trips above which to alert
    pub circuit_breaker_trips: u64,
    /// Cache hit rate percentage below which to alert
    pub cache_hit_rate_percent: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_rate_percent: 10.0,
            response_time_secs: 30.0,
            circuit_breaker_trips: 3,
            cache_hit_rate_percent: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.resolver.workers, 5);
        assert_eq!(config.resolver.min_delay(), Duration::from_millis(500));
        assert!((config.resolver.fuzzy_threshold - 65.0).abs() < f64::EPSILON);
        assert_eq!(config.resilience.default_retry.max_attempts, 3);
        assert_eq!(config.resilience.web_search_retry.max_attempts, 2);
        assert_eq!(config.resilience.homepage_breaker.failure_threshold, 3);
        assert_eq!(config.web.max_queries, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[resolver]"));
        assert!(toml_str.contains("[resilience.default_retry]"));
        assert!(toml_str.contains("[web]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.resolver.workers, config.resolver.workers);
        assert_eq!(parsed.resilience.homepage_retry, config.resilience.homepage_retry);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        let mut config = AppConfig::default();
        config.resolver.workers = 12;
        config.cache.database_path = Some(tmp.path().join("cache.db"));

        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.resolver.workers, 12);
        assert_eq!(
            loaded.cache_database_path().expect("database path"),
            tmp.path().join("cache.db")
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[resolver]
workers = 8

[resilience.web_search_retry]
max_attempts = 4
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.resolver.workers, 8);
        assert_eq!(config.resilience.web_search_retry.max_attempts, 4);
        // Unspecified fields keep their defaults
        assert!((config.resilience.web_search_retry.base_delay_secs - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.resilience.default_breaker.failure_threshold, 5);
        assert!(config.resolver.use_web);
    }

    #[test]
    fn test_retry_policy_validation() {
        assert!(RetryPolicy::default().validate("retry").is_ok());
        assert!(RetryPolicy::new(0, 1.0, 2.0, 2.0).validate("retry").is_err());
        assert!(RetryPolicy::new(3, 0.0, 2.0, 2.0).validate("retry").is_err());
        assert!(RetryPolicy::new(3, 2.0, 1.0, 2.0).validate("retry").is_err());
        assert!(RetryPolicy::new(3, 1.0, 2.0, 1.0).validate("retry").is_err());
    }

    #[test]
    fn test_breaker_policy_validation() {
        assert!(BreakerPolicy::default().validate("breaker").is_ok());
        assert!(BreakerPolicy::new(0, 1.0, 1).validate("breaker").is_err());
        assert!(BreakerPolicy::new(3, 1.0, 0).validate("breaker").is_err());
        assert!(BreakerPolicy::new(3, -1.0, 1).validate("breaker").is_err());
    }

    #[test]
    fn test_invalid_workers_rejected() {
        let mut config = AppConfig::default();
        config.resolver.workers = 0;
        let err = config.validate().expect_err("zero workers");
        assert!(err.to_string().contains("resolver.workers"));
    }
}
