//! Domain resolution orchestrator.
//!
//! Coordinates the cache, the local matcher and the web lookup across a
//! batch of domains, with a bounded number of resolutions in flight.

use crate::error::{ResolveError, Result};
use crate::lookup::DomainLookup;
use crate::progress::{ProgressReporter, TracingProgress};
use futures::stream::{FuturesUnordered, StreamExt};
use sectorlens_core::{AppConfig, Domain, ResolutionResult, ResolutionSource, RetryPolicy};
use sectorlens_db::CacheStore;
use sectorlens_matcher::{LocalMatcher, MatchOutcome};
use sectorlens_resilience::Resilience;
use sectorlens_web::WebError;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Default number of concurrent resolutions.
pub const DEFAULT_WORKERS: usize = 5;

/// Resolves batches of domains.
pub struct DomainResolver {
    cache: Arc<CacheStore>,
    matcher: LocalMatcher,
    lookup: Option<Arc<dyn DomainLookup>>,
    resilience: Arc<Resilience>,
    retry: RetryPolicy,
    workers: usize,
    progress: Arc<dyn ProgressReporter>,
}

impl DomainResolver {
    /// Create a resolver.
    ///
    /// Without a `lookup`, domains the matcher leaves unresolved fall back
    /// to `("Unknown", "Unknown")`.
    pub fn new(
        cache: Arc<CacheStore>,
        matcher: LocalMatcher,
        lookup: Option<Arc<dyn DomainLookup>>,
        resilience: Arc<Resilience>,
        config: &AppConfig,
    ) -> Self {
        Self {
            cache,
            matcher,
            lookup,
            resilience,
            retry: config.resilience.default_retry.clone(),
            workers: config.resolver.workers.max(1),
            progress: Arc::new(TracingProgress),
        }
    }

    /// Set the maximum number of concurrent resolutions.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Replace the progress reporter.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Shared resilience substrate.
    pub fn resilience(&self) -> &Arc<Resilience> {
        &self.resilience
    }

    /// Resolve every domain in `domains`.
    ///
    /// The returned map has one entry per unique input domain. Only an
    /// unreachable cache store fails the run; any other failure degrades
    /// the affected domain to `("Unknown", "Unknown")`.
    ///
    /// # Errors
    /// Returns [`ResolveError::CacheUnavailable`] if the cache store does
    /// not answer before the run starts.
    pub async fn resolve_all(
        &self,
        domains: impl IntoIterator<Item = Domain>,
    ) -> Result<BTreeMap<Domain, ResolutionResult>> {
        self.cache.verify().await?;

        let mut seen = HashSet::new();
        let unique: Vec<Domain> = domains
            .into_iter()
            .filter(|domain| seen.insert(domain.clone()))
            .collect();
        let total = unique.len();

        self.progress.started(total);

        let mut results = BTreeMap::new();
        let mut futures = FuturesUnordered::new();

        for domain in unique {
            futures.push(self.resolve_one(domain));

            // Respect concurrency limit
            while futures.len() >= self.workers {
                if let Some(result) = futures.next().await {
                    self.collect(&mut results, result, total);
                }
            }
        }

        while let Some(result) = futures.next().await {
            self.collect(&mut results, result, total);
        }

        self.progress.finished(total);
        Ok(results)
    }

    fn collect(
        &self,
        results: &mut BTreeMap<Domain, ResolutionResult>,
        result: ResolutionResult,
        total: usize,
    ) {
        self.progress.resolved(&result, results.len() + 1, total);
        results.insert(result.domain.clone(), result);
    }

    /// Resolve a single domain. Never fails.
    pub async fn resolve_one(&self, domain: Domain) -> ResolutionResult {
        match self.try_resolve(&domain).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(domain = %domain, error = %err, "Resolution failed");
                ResolutionResult::unknown(domain)
            }
        }
    }

    async fn try_resolve(&self, domain: &Domain) -> Result<ResolutionResult> {
        let metrics = self.resilience.metrics();

        match self.cache.get(domain).await? {
            Some(entry) if !entry.is_weak() => {
                metrics.record_cache_hit();
                tracing::debug!(domain = %domain, "Cache hit");
                return Ok(ResolutionResult::new(
                    domain.clone(),
                    entry.value(),
                    ResolutionSource::Cache,
                ));
            }
            _ => metrics.record_cache_miss(),
        }

        match self.matcher.match_domain(domain.as_str()) {
            MatchOutcome::Matched { result, kind } => {
                tracing::debug!(domain = %domain, ?kind, "Local match");
                return Ok(ResolutionResult::new(
                    domain.clone(),
                    result,
                    ResolutionSource::LocalMatch,
                ));
            }
            MatchOutcome::Synthesized(value) => {
                return Ok(ResolutionResult::new(
                    domain.clone(),
                    value,
                    ResolutionSource::Fallback,
                ));
            }
            MatchOutcome::Unresolved => {}
        }

        let Some(lookup) = &self.lookup else {
            tracing::debug!(domain = %domain, "No local match and web lookup disabled");
            return Ok(ResolutionResult::unknown(domain.clone()));
        };

        let breaker = self.resilience.breakers().default_breaker();
        let value = self
            .resilience
            .call(&breaker, &self.retry, domain.as_str(), || lookup.lookup(domain))
            .await
            .map_err(|err| ResolveError::Lookup {
                domain: domain.to_string(),
                source: WebError::from(err),
            })?;

        Ok(ResolutionResult::new(
            domain.clone(),
            value,
            ResolutionSource::WebSearch,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sectorlens_core::{BreakerPolicy, CompanySector};
    use sectorlens_db::{Database, FlatFileMirror};
    use sectorlens_matcher::{ReferenceRow, ReferenceTable};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DomainLookup for Counting {
        async fn lookup(&self, domain: &Domain) -> std::result::Result<CompanySector, WebError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompanySector::new(domain.label(), "Technology"))
        }
    }

    async fn cache(tmp: &TempDir) -> Arc<CacheStore> {
        let db = Database::open_migrated(":memory:")
            .await
            .expect("open database");
        Arc::new(CacheStore::new(
            db,
            FlatFileMirror::new(tmp.path().join("search_cache.csv")),
        ))
    }

    fn matcher() -> LocalMatcher {
        LocalMatcher::new(Arc::new(ReferenceTable::from_rows(vec![ReferenceRow::new(
            "acme.com",
            "Acme Corp",
            "Manufacturing",
        )])))
    }

    #[tokio::test]
    async fn test_source_ladder() {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = cache(&tmp).await;
        cache
            .put(&Domain::new("cached.io").expect("valid domain"), "Cached", "Retail")
            .await
            .expect("put");

        let lookup = Arc::new(Counting {
            calls: AtomicUsize::new(0),
        });
        let resolver = DomainResolver::new(
            cache,
            matcher(),
            Some(lookup.clone()),
            Arc::new(Resilience::new(BreakerPolicy::default())),
            &AppConfig::default(),
        )
        .with_progress(Arc::new(crate::progress::NoProgress));

        let cached = resolver
            .resolve_one(Domain::new("cached.io").expect("valid domain"))
            .await;
        assert_eq!(cached.source, ResolutionSource::Cache);
        assert_eq!(cached.sector, "Retail");

        let local = resolver
            .resolve_one(Domain::new("acme.com").expect("valid domain"))
            .await;
        assert_eq!(local.source, ResolutionSource::LocalMatch);
        assert_eq!(local.company, "Acme Corp");

        let web = resolver
            .resolve_one(Domain::new("qqqvvvxxx.dev").expect("valid domain"))
            .await;
        assert_eq!(web.source, ResolutionSource::WebSearch);
        assert_eq!(web.sector, "Technology");
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);

        let snapshot = resolver.resilience().metrics().snapshot();
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.cache_misses, 2);
    }

    #[tokio::test]
    async fn test_without_lookup_falls_back_to_unknown() {
        let tmp = TempDir::new().expect("create temp dir");
        let resolver = DomainResolver::new(
            cache(&tmp).await,
            matcher(),
            None,
            Arc::new(Resilience::new(BreakerPolicy::default())),
            &AppConfig::default(),
        );

        let result = resolver
            .resolve_one(Domain::new("qqqvvvxxx.dev").expect("valid domain"))
            .await;
        assert_eq!(result, ResolutionResult::unknown(result.domain.clone()));
    }

    #[tokio::test]
    async fn test_synthesized_when_web_disabled() {
        let tmp = TempDir::new().expect("create temp dir");
        let resolver = DomainResolver::new(
            cache(&tmp).await,
            matcher().with_web_fallback(false),
            None,
            Arc::new(Resilience::new(BreakerPolicy::default())),
            &AppConfig::default(),
        );

        let result = resolver
            .resolve_one(Domain::new("qqqvvvxxx.dev").expect("valid domain"))
            .await;
        assert_eq!(result.source, ResolutionSource::Fallback);
        assert_ne!(result.company, sectorlens_core::UNKNOWN);
    }
}
