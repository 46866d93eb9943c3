//! Homepage retrieval.

use crate::error::{Result, WebError};
use crate::fetcher::HttpFetch;
use sectorlens_core::{BreakerPolicy, Domain, RetryPolicy};
use sectorlens_resilience::Resilience;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Text that marks a page as blocked, parked or otherwise useless.
pub const BLOCKED_INDICATORS: &[&str] = &[
    "blocked",
    "captcha",
    "cloudflare",
    "access denied",
    "domain parking",
    "this domain may be for sale",
    "coming soon",
    "403 forbidden",
    "404 not found",
];

/// A fetched homepage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homepage {
    /// URL after redirects
    pub url: String,
    /// Raw HTML
    pub body: String,
}

/// Candidate URLs in the order they are tried.
///
/// A bare label (`acme`) is treated as `acme.com`.
pub fn candidate_urls(domain: &Domain) -> Vec<String> {
    let host = if domain.has_tld() {
        domain.as_str().to_string()
    } else {
        format!("{domain}.com")
    };
    vec![
        format!("https://www.{host}"),
        format!("https://{host}"),
        format!("http://www.{host}"),
        format!("http://{host}"),
    ]
}

/// First blocked indicator found in `body`, if any.
pub fn blocked_indicator(body: &str) -> Option<&'static str> {
    let lower = body.to_lowercase();
    BLOCKED_INDICATORS
        .iter()
        .copied()
        .find(|indicator| lower.contains(indicator))
}

/// Fetches a domain's homepage through its per-domain breaker.
pub struct HomepageFetcher {
    fetcher: Arc<dyn HttpFetch>,
    resilience: Arc<Resilience>,
    retry: RetryPolicy,
    breaker_policy: BreakerPolicy,
    min_delay: Duration,
}

impl HomepageFetcher {
    /// Create a fetcher.
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
        }
    }

    /// Fetch the first usable homepage among the candidate URLs.
    ///
    /// The whole sweep is one resilient call: it is retried only when the
    /// last candidate failed with a transient error.
    pub async fn fetch(&self, domain: &Domain) -> Result<Homepage> {
        let breaker = self
            .resilience
            .breakers()
            .for_domain(domain.as_str(), &self.breaker_policy);
        let urls = candidate_urls(domain);

        let homepage = self
            .resilience
            .call(&breaker, &self.retry, domain.as_str(), || self.sweep(&urls))
            .await?;

        tracing::info!(domain = %domain, url = %homepage.url, "Fetched homepage");
        Ok(homepage)
    }

    async fn sweep(&self, urls: &[String]) -> Result<Homepage> {
        let mut last_error = None;

        for url in urls {
            match self.try_candidate(url).await {
                Ok(homepage) => return Ok(homepage),
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "Homepage candidate failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| WebError::Blocked {
            url: String::new(),
            reason: "no candidate URLs".to_string(),
        }))
    }

    async fn try_candidate(&self, url: &str) -> Result<Homepage> {
        if let Some(host) = Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            self.resilience
                .rate_limiter()
                .wait(&host, self.min_delay)
                .await;
        }

        let page = self.fetcher.get(url).await?;
        if !page.is_ok() {
            return Err(WebError::Status {
                url: url.to_string(),
                status: page.status,
            });
        }
        if let Some(indicator) = blocked_indicator(&page.body) {
            return Err(WebError::Blocked {
                url: url.to_string(),
                reason: format!("page contains '{indicator}'"),
            });
        }

        Ok(Homepage {
            url: page.final_url,
            body: page.body,
        })
    }
}
