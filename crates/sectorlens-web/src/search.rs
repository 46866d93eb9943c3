//! Search-engine client.

use crate::error::{Result, WebError};
use crate::fetcher::HttpFetch;
use crate::parser::{ExtractorChain, RawLink};
use sectorlens_core::{BreakerPolicy, Domain, RetryPolicy};
use sectorlens_resilience::{CallError, Resilience};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Endpoints tried in order for every query.
pub const SEARCH_ENDPOINTS: &[&str] = &[
    "https://html.duckduckgo.com/html/?q=",
    "https://lite.duckduckgo.com/lite/?q=",
];

/// Breaker shared by all search traffic.
pub const SEARCH_BREAKER: &str = "web_search";

const REDIRECT_BASE: &str = "https://duckduckgo.com";

/// A search result with its target URL decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Result title
    pub title: String,
    /// Target URL
    pub url: String,
}

impl SearchHit {
    /// Host of the target URL without a leading `www.`.
    pub fn host(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        let host = url.host_str()?;
        Some(host.strip_prefix("www.").unwrap_or(host).to_lowercase())
    }

    /// Whether the result points at `domain` (either contains the other).
    pub fn points_to(&self, domain: &Domain) -> bool {
        self.host()
            .filter(|host| !host.is_empty())
            .is_some_and(|host| host.contains(domain.as_str()) || domain.as_str().contains(&host))
    }
}

/// Identity queries for a domain, most specific framing first.
pub fn build_queries(domain: &Domain) -> Vec<String> {
    let d = domain.as_str();
    let name = domain.label();
    vec![
        format!("{d} company"),
        format!("{d} business"),
        format!("{d} corporation"),
        format!("site:{d} about us"),
        format!("site:{d} services"),
        format!("site:{d} company profile"),
        format!("{} company sector industry", d.replace('.', " ")),
        format!("{name} company {d}"),
        format!("{name} business sector industry"),
        format!("{d} what is company"),
        format!("{d} business type sector"),
        format!("\"{name}\" company website"),
        format!("\"{d}\" official website"),
        format!("{name} inc corp ltd company"),
    ]
}

/// Follow-up query used when the identity queries yield no sector.
pub fn sector_query(domain: &Domain) -> String {
    format!("{domain} industry sector")
}

/// Whether a result page is a captcha or block page.
pub fn is_blocked_page(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("captcha") || lower.contains("blocked")
}

/// Resolve a result `href` to its target URL.
///
/// Redirect links carrying a `uddg` parameter are decoded; relative links
/// are resolved against the search host.
pub fn decode_result_url(href: &str) -> Option<String> {
    let base = Url::parse(REDIRECT_BASE).ok()?;
    let url = base.join(href).ok()?;

    if let Some((_, target)) = url.query_pairs().find(|(key, _)| key == "uddg") {
        return Some(target.into_owned());
    }
    Some(url.to_string())
}

/// Search client: endpoints in turn, rate-limited, behind the search
/// breaker and retry policy.
pub struct SearchClient {
    fetcher: Arc<dyn HttpFetch>,
    resilience: Arc<Resilience>,
    retry: RetryPolicy,
    breaker_policy: BreakerPolicy,
    min_delay: Duration,
    extractor: ExtractorChain,
}

impl SearchClient {
    /// Create a client.
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        resilience: Arc<Resilience>,
        retry: RetryPolicy,
        breaker_policy: BreakerPolicy,
        min_delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            resilience,
            retry,
            breaker_policy,
            min_delay,
            extractor: ExtractorChain::default(),
        }
    }

    /// Replace the result extractor chain.
    #[must_use]
    pub fn with_extractor(mut self, extractor: ExtractorChain) -> Self {
        self.extractor = extractor;
        self
    }

    /// Run `query` and return at most `max_results` hits.
    ///
    /// An endpoint that fails or yields nothing hands over to the next
    /// one. An open breaker fails immediately.
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let breaker = self
            .resilience
            .breakers()
            .get_or_create(SEARCH_BREAKER, &self.breaker_policy);
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        let mut last_error = None;

        for endpoint in SEARCH_ENDPOINTS {
            let url = format!("{endpoint}{encoded}");
            let host = Url::parse(&url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string))
                .unwrap_or_default();

            let result = self
                .resilience
                .call(&breaker, &self.retry, &host, || self.fetch_results(&url, &host))
                .await;

            match result {
                Ok(links) if !links.is_empty() => {
                    return Ok(links
                        .into_iter()
                        .filter_map(|link| {
                            decode_result_url(&link.href).map(|url| SearchHit {
                                title: link.title,
                                url,
                            })
                        })
                        .take(max_results)
                        .collect());
                }
                Ok(_) => tracing::debug!(query, endpoint = %host, "No results"),
                Err(err @ CallError::CircuitOpen { .. }) => return Err(err.into()),
                Err(CallError::Failed(err)) => {
                    tracing::debug!(
                        query,
                        endpoint = %host,
                        error = %err,
                        "Search endpoint failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) => {
                tracing::warn!(query, error = %err, "All search endpoints failed");
                Err(err)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_results(&self, url: &str, host: &str) -> Result<Vec<RawLink>> {
        self.resilience
            .rate_limiter()
            .wait(host, self.min_delay)
            .await;

        let page = self.fetcher.get(url).await?;
        if page.status != 200 {
            return Err(WebError::Status {
                url: url.to_string(),
                status: page.status,
            });
        }
        if is_blocked_page(&page.body) {
            return Err(WebError::Blocked {
                url: url.to_string(),
                reason: "captcha or block page".to_string(),
            });
        }

        Ok(self.extractor.extract(&page.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchedPage;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn test_build_queries() {
        let domain = Domain::new("acme.com").expect("valid domain");
        let queries = build_queries(&domain);
        assert_eq!(queries.len(), 14);
        assert_eq!(queries[0], "acme.com company");
        assert_eq!(queries[3], "site:acme.com about us");
        assert_eq!(queries[6], "acme com company sector industry");
        assert_eq!(queries[7], "acme company acme.com");
        assert_eq!(sector_query(&domain), "acme.com industry sector");
    }

    #[test]
    fn test_decode_redirect() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.acme.com%2Fabout&rut=abc";
        assert_eq!(
            decode_result_url(href).as_deref(),
            Some("https://www.acme.com/about")
        );
        assert_eq!(
            decode_result_url("https://acme.com/").as_deref(),
            Some("https://acme.com/")
        );
    }

    #[test]
    fn test_hit_points_to_domain() {
        let hit = SearchHit {
            title: "Acme".to_string(),
            url: "https://www.acme.com/about".to_string(),
        };
        assert_eq!(hit.host().as_deref(), Some("acme.com"));
        assert!(hit.points_to(&Domain::new("acme.com").expect("valid domain")));
        assert!(hit.points_to(&Domain::new("acme").expect("valid domain")));
        assert!(!hit.points_to(&Domain::new("globex.com").expect("valid domain")));
    }

    #[test]
    fn test_blocked_page() {
        assert!(is_blocked_page("<p>Please solve the CAPTCHA</p>"));
        assert!(!is_blocked_page("<p>Acme results</p>"));
    }

    /// Serves a captcha on the first endpoint and results on the second.
    struct CaptchaThenLite {
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpFetch for CaptchaThenLite {
        async fn get(&self, url: &str) -> Result<FetchedPage> {
            self.urls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(url.to_string());
            let body = if url.starts_with("https://html.") {
                "<p>captcha required</p>".to_string()
            } else {
                r#"<table><tr><td><a class="result-link" href="https://acme.com/">Acme Corp</a></td></tr></table>"#
                    .to_string()
            };
            Ok(FetchedPage {
                status: 200,
                final_url: url.to_string(),
                body,
            })
        }
    }

    #[tokio::test]
    async fn test_blocked_endpoint_falls_through() {
        let fetcher = Arc::new(CaptchaThenLite {
            urls: Mutex::new(Vec::new()),
        });
        let resilience = Arc::new(Resilience::new(BreakerPolicy::default()));
        let client = SearchClient::new(
            fetcher.clone(),
            Arc::clone(&resilience),
            RetryPolicy::new(3, 0.001, 0.002, 2.0),
            BreakerPolicy::web(),
            Duration::ZERO,
        );

        let hits = client
            .search("acme.com company", 5)
            .await
            .expect("search succeeds");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Acme Corp");

        // The block page is not retried
        let urls = fetcher.urls.lock().expect("lock urls");
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("acme.com+company"));
        assert_eq!(resilience.metrics().snapshot().requests_retried, 0);
    }
}
