//! Web resolution of a single domain.

use crate::company_name::{self, capitalize};
use crate::error::Result;
use crate::fetcher::{HttpFetch, ReqwestFetcher};
use crate::homepage::{Homepage, HomepageFetcher};
use crate::knowledge_graph::{KnowledgeGraph, NoKnowledgeGraph, WikidataClient};
use crate::search::{build_queries, sector_query, SearchClient};
use crate::sector::{guess_sector_from_domain, infer_sector, score_keywords};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use sectorlens_core::{AppConfig, CompanySector, Domain};
use sectorlens_db::CacheStore;
use sectorlens_resilience::Resilience;
use std::sync::Arc;

/// Hits requested by the follow-up sector query.
const SECTOR_QUERY_RESULTS: usize = 3;

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

static DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"], meta[property="og:description"]"#)
        .expect("valid selector")
});

/// Visible text of a page plus its meta descriptions.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<String> = document
        .select(&DESCRIPTION)
        .filter_map(|meta| meta.value().attr("content"))
        .map(str::to_string)
        .collect();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if !hidden && !text.trim().is_empty() {
            parts.push(text.trim().to_string());
        }
    }

    parts.join(" ")
}

/// What the identity queries turned up.
#[derive(Debug, Default)]
struct Findings {
    titles: Vec<String>,
    candidate: Option<String>,
    homepage: Option<Homepage>,
}

/// Resolves a domain from search results, its homepage and a knowledge
/// graph. Every answer is written to the cache before it is returned.
pub struct WebResolver {
    search: SearchClient,
    homepage: HomepageFetcher,
    knowledge_graph: Arc<dyn KnowledgeGraph>,
    cache: Arc<CacheStore>,
    max_queries: usize,
    max_results: usize,
}

impl WebResolver {
    /// Wire a resolver from configuration over the given HTTP seam.
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        resilience: Arc<Resilience>,
        cache: Arc<CacheStore>,
        config: &AppConfig,
    ) -> Self {
        let min_delay = config.resolver.min_delay();
        let policies = &config.resilience;

        let search = SearchClient::new(
            Arc::clone(&fetcher),
            Arc::clone(&resilience),
            policies.web_search_retry.clone(),
            policies.web_search_breaker.clone(),
            min_delay,
        );
        let homepage = HomepageFetcher::new(
            Arc::clone(&fetcher),
            Arc::clone(&resilience),
            policies.homepage_retry.clone(),
            policies.homepage_breaker.clone(),
            min_delay,
        );
        let knowledge_graph: Arc<dyn KnowledgeGraph> = if config.web.knowledge_graph {
            Arc::new(WikidataClient::new(
                fetcher,
                resilience,
                policies.web_search_retry.clone(),
                policies.web_search_breaker.clone(),
            ))
        } else {
            Arc::new(NoKnowledgeGraph)
        };

        Self {
            search,
            homepage,
            knowledge_graph,
            cache,
            max_queries: config.web.max_queries,
            max_results: config.web.max_results,
        }
    }

    /// Wire a resolver that talks to the network through `reqwest`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn from_config(
        resilience: Arc<Resilience>,
        cache: Arc<CacheStore>,
        config: &AppConfig,
    ) -> Result<Self> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.web.timeout())?);
        Ok(Self::new(fetcher, resilience, cache, config))
    }

    /// Replace the knowledge graph.
    #[must_use]
    pub fn with_knowledge_graph(mut self, knowledge_graph: Arc<dyn KnowledgeGraph>) -> Self {
        self.knowledge_graph = knowledge_graph;
        self
    }

    /// Resolve `domain` and cache the answer.
    ///
    /// The sector is never `Unknown`: when nothing else works it is guessed
    /// from the domain string. Fails only if a breaker rejects the whole
    /// path or the cache write fails.
    pub async fn resolve(&self, domain: &Domain) -> Result<CompanySector> {
        tracing::info!(domain = %domain, "Resolving on the web");

        let findings = self.investigate(domain).await;
        let company = self.company_name(domain, &findings);

        let page = findings
            .homepage
            .as_ref()
            .map(|homepage| page_text(&homepage.body))
            .unwrap_or_default();
        let combined = format!("{page} {} {company}", findings.titles.join(" "));
        let mut sector = infer_sector(&combined, &[company.as_str(), domain.label()])
            .map(str::to_string);

        if sector.is_none() {
            sector = self.sector_from_follow_up(domain).await;
        }

        if sector.is_none() && (findings.candidate.is_some() || findings.homepage.is_some()) {
            sector = self.knowledge_graph.lookup_sector(&company).await;
        }

        let sector = sector.unwrap_or_else(|| {
            let guess = guess_sector_from_domain(domain.as_str());
            tracing::debug!(domain = %domain, sector = guess, "Guessed sector from domain");
            guess.to_string()
        });

        self.cache.put(domain, &company, &sector).await?;
        tracing::info!(
            domain = %domain,
            company = %company,
            sector = %sector,
            "Resolved on the web"
        );
        Ok(CompanySector::new(company, sector))
    }

    async fn investigate(&self, domain: &Domain) -> Findings {
        let mut findings = Findings::default();
        let mut homepage_attempted = false;

        for query in build_queries(domain).iter().take(self.max_queries) {
            let hits = match self.search.search(query, self.max_results).await {
                Ok(hits) => hits,
                Err(err) => {
                    tracing::warn!(
                        domain = %domain,
                        query = %query,
                        error = %err,
                        "Search query failed"
                    );
                    continue;
                }
            };

            for hit in hits {
                let points_to_domain = hit.points_to(domain);
                findings.titles.push(hit.title.clone());

                if !points_to_domain {
                    continue;
                }
                if findings.candidate.is_none() {
                    findings.candidate = Some(hit.title);
                }
                if !homepage_attempted {
                    homepage_attempted = true;
                    match self.homepage.fetch(domain).await {
                        Ok(homepage) => {
                            findings.homepage = Some(homepage);
                            break;
                        }
                        Err(err) => {
                            tracing::debug!(domain = %domain, error = %err, "No usable homepage");
                        }
                    }
                }
            }
        }

        findings
    }

    fn company_name(&self, domain: &Domain, findings: &Findings) -> String {
        let from_homepage = findings.homepage.as_ref().and_then(|homepage| {
            company_name::extract(&homepage.body, Some(homepage.url.as_str()))
        });

        from_homepage
            .or_else(|| {
                findings
                    .candidate
                    .as_deref()
                    .and_then(company_name::clean_candidate)
                    .filter(|name| company_name::is_valid_name(name))
            })
            .unwrap_or_else(|| capitalize(domain.label()))
    }

    async fn sector_from_follow_up(&self, domain: &Domain) -> Option<String> {
        let query = sector_query(domain);
        match self.search.search(&query, SECTOR_QUERY_RESULTS).await {
            Ok(hits) => {
                let titles: Vec<_> = hits.into_iter().map(|hit| hit.title).collect();
                score_keywords(&titles.join(" ")).map(str::to_string)
            }
            Err(err) => {
                tracing::debug!(domain = %domain, error = %err, "Sector query failed");
                None
            }
        }
    }
}
