//! HTTP seam used by every web component.

use crate::error::{Result, WebError};
use crate::fingerprint::{BrowserProfile, ACCEPT_HTML};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;

/// A fetched response. Non-200 statuses are returned, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// URL after redirects
    pub final_url: String,
    /// Response body as text
    pub body: String,
}

impl FetchedPage {
    /// Whether the response is a 200 with a body.
    pub fn is_ok(&self) -> bool {
        self.status == 200 && !self.body.is_empty()
    }
}

/// Fetch a URL with a GET request.
///
/// Implementations must map timeouts to [`WebError::Timeout`] and
/// connection failures to [`WebError::Transient`] so the retry layer can
/// classify them.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// GET `url` and return the response, whatever its status.
    async fn get(&self, url: &str) -> Result<FetchedPage>;
}

/// [`HttpFetch`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Build a client with the given per-request timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WebError::Client(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    fn map_error(url: &str, err: &reqwest::Error) -> WebError {
        if err.is_timeout() {
            WebError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_builder() {
            WebError::Client(err.to_string())
        } else {
            WebError::Transient {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        let profile = BrowserProfile::randomized();
        tracing::trace!(url, user_agent = profile.user_agent, "GET");

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, profile.user_agent)
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, profile.accept_language)
            .header("DNT", "1")
            .send()
            .await
            .map_err(|e| Self::map_error(url, &e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| Self::map_error(url, &e))?;

        Ok(FetchedPage {
            status,
            final_url,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_is_ok() {
        let page = FetchedPage {
            status: 200,
            final_url: "https://acme.com/".to_string(),
            body: "<html></html>".to_string(),
        };
        assert!(page.is_ok());

        let empty = FetchedPage {
            body: String::new(),
            ..page.clone()
        };
        assert!(!empty.is_ok());

        let missing = FetchedPage {
            status: 404,
            ..page
        };
        assert!(!missing.is_ok());
    }

    #[test]
    fn test_client_builds() {
        assert!(ReqwestFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
