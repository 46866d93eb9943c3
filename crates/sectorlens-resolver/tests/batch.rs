//! Batch resolution against fake lookups and a scripted web.

use async_trait::async_trait;
use sectorlens_core::{
    AppConfig, BreakerPolicy, CompanySector, Domain, ResolutionSource, RetryPolicy, UNKNOWN,
};
use sectorlens_db::{CacheStore, Database, FlatFileMirror};
use sectorlens_matcher::{LocalMatcher, ReferenceRow, ReferenceTable};
use sectorlens_resilience::Resilience;
use sectorlens_resolver::{DomainLookup, DomainResolver, NoProgress, ResolveError};
use sectorlens_web::{FetchedPage, HttpFetch, WebError, WebResolver};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Succeeds for every domain except `broken.com`, which always times out.
struct OneBroken {
    calls: AtomicUsize,
}

#[async_trait]
impl DomainLookup for OneBroken {
    async fn lookup(&self, domain: &Domain) -> Result<CompanySector, WebError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if domain.as_str() == "broken.com" {
            return Err(WebError::Timeout {
                url: format!("https://{domain}"),
            });
        }
        Ok(CompanySector::new(domain.label().to_uppercase(), "Technology"))
    }
}

/// Answers every request with a 404 and counts them.
struct NotFound {
    calls: AtomicUsize,
}

#[async_trait]
impl HttpFetch for NotFound {
    async fn get(&self, url: &str) -> Result<FetchedPage, WebError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(FetchedPage {
            status: 404,
            final_url: url.to_string(),
            body: String::new(),
        })
    }
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.resolver.min_delay_ms = 0;
    config.resolver.workers = 3;
    config.web.knowledge_graph = false;
    let fast = RetryPolicy::new(3, 0.001, 0.001, 2.0);
    config.resilience.default_retry = fast.clone();
    config.resilience.web_search_retry = fast.clone();
    config.resilience.homepage_retry = fast;
    config.validate().expect("valid test config");
    config
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

fn empty_matcher() -> LocalMatcher {
    LocalMatcher::new(Arc::new(ReferenceTable::from_rows(Vec::<ReferenceRow>::new())))
}

fn domains(names: &[&str]) -> Vec<Domain> {
    names
        .iter()
        .map(|name| Domain::new(name).expect("valid domain"))
        .collect()
}

#[tokio::test]
async fn test_one_failing_domain_does_not_sink_the_batch() {
    let tmp = TempDir::new().expect("create temp dir");
    let lookup = Arc::new(OneBroken {
        calls: AtomicUsize::new(0),
    });
    let resolver = DomainResolver::new(
        cache(&tmp).await,
        empty_matcher(),
        Some(lookup.clone()),
        Arc::new(Resilience::new(BreakerPolicy::default())),
        &config(),
    )
    .with_progress(Arc::new(NoProgress));

    let input = domains(&[
        "alpha.com",
        "bravo.com",
        "charlie.com",
        "broken.com",
        "delta.com",
        "echo.com",
        "foxtrot.com",
        "golf.com",
        "hotel.com",
        "india.com",
    ]);
    let results = resolver.resolve_all(input.clone()).await.expect("resolve");

    assert_eq!(results.len(), 10);
    for domain in &input {
        assert!(results.contains_key(domain), "missing {domain}");
    }

    let broken = &results[&Domain::new("broken.com").expect("valid domain")];
    assert_eq!(broken.company, UNKNOWN);
    assert_eq!(broken.sector, UNKNOWN);
    assert_eq!(broken.source, ResolutionSource::Fallback);

    let alpha = &results[&Domain::new("alpha.com").expect("valid domain")];
    assert_eq!(alpha.company, "ALPHA");
    assert_eq!(alpha.source, ResolutionSource::WebSearch);

    // Nine successes plus three attempts on the broken domain
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 12);

    let snapshot = resolver.resilience().metrics().snapshot();
    assert_eq!(snapshot.requests_failed, 1);
    assert_eq!(snapshot.requests_success, 9);
}

#[tokio::test]
async fn test_duplicates_resolve_once() {
    let tmp = TempDir::new().expect("create temp dir");
    let lookup = Arc::new(OneBroken {
        calls: AtomicUsize::new(0),
    });
    let resolver = DomainResolver::new(
        cache(&tmp).await,
        empty_matcher(),
        Some(lookup.clone()),
        Arc::new(Resilience::new(BreakerPolicy::default())),
        &config(),
    )
    .with_workers(1)
    .with_progress(Arc::new(NoProgress));

    let results = resolver
        .resolve_all(domains(&["alpha.com", "ALPHA.com", "www.alpha.com", "bravo.com"]))
        .await
        .expect("resolve");

    assert_eq!(results.len(), 2);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_second_resolution_is_served_from_cache() {
    let tmp = TempDir::new().expect("create temp dir");
    let cache = cache(&tmp).await;
    let config = config();
    let resilience = Arc::new(Resilience::new(BreakerPolicy::default()));
    let fetcher = Arc::new(NotFound {
        calls: AtomicUsize::new(0),
    });
    let web = WebResolver::new(
        fetcher.clone(),
        Arc::clone(&resilience),
        Arc::clone(&cache),
        &config,
    );
    let resolver = DomainResolver::new(
        cache,
        empty_matcher(),
        Some(Arc::new(web)),
        resilience,
        &config,
    )
    .with_progress(Arc::new(NoProgress));
    let domain = Domain::new("northwind-bank.com").expect("valid domain");

    let first = resolver.resolve_one(domain.clone()).await;
    assert_eq!(first.source, ResolutionSource::WebSearch);
    assert_eq!(first.company, "Northwind-bank");
    assert_eq!(first.sector, "Finance");
    let calls_after_first = fetcher.calls.load(Ordering::SeqCst);
    assert!(calls_after_first > 0);

    let second = resolver.resolve_one(domain).await;
    assert_eq!(second.source, ResolutionSource::Cache);
    assert_eq!(second.company, first.company);
    assert_eq!(second.sector, first.sector);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), calls_after_first);
}

#[tokio::test]
async fn test_local_matches_skip_the_web() {
    let tmp = TempDir::new().expect("create temp dir");
    let lookup = Arc::new(OneBroken {
        calls: AtomicUsize::new(0),
    });
    let table = ReferenceTable::from_rows(vec![
        ReferenceRow::new("widgetsinc.com", "Widgets Inc", "Manufacturing"),
        ReferenceRow::new("globex.com", "Globex", "Energy"),
    ]);
    let resolver = DomainResolver::new(
        cache(&tmp).await,
        LocalMatcher::new(Arc::new(table)),
        Some(lookup.clone()),
        Arc::new(Resilience::new(BreakerPolicy::default())),
        &config(),
    )
    .with_progress(Arc::new(NoProgress));

    let results = resolver
        .resolve_all(domains(&["widgetsinc.net", "globex.com"]))
        .await
        .expect("resolve");

    let widgets = &results[&Domain::new("widgetsinc.net").expect("valid domain")];
    assert_eq!(widgets.company, "Widgets Inc");
    assert_eq!(widgets.source, ResolutionSource::LocalMatch);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unreachable_cache_is_fatal() {
    let tmp = TempDir::new().expect("create temp dir");
    let cache = cache(&tmp).await;
    cache.database().pool().close().await;

    let resolver = DomainResolver::new(
        cache,
        empty_matcher(),
        None,
        Arc::new(Resilience::new(BreakerPolicy::default())),
        &config(),
    )
    .with_progress(Arc::new(NoProgress));

    let err = resolver
        .resolve_all(domains(&["alpha.com"]))
        .await
        .expect_err("closed pool must fail");
    assert!(matches!(err, ResolveError::CacheUnavailable(_)));
}
