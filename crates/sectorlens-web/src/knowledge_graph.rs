//! Knowledge-graph sector lookup.

use crate::error::{Result, WebError};
use crate::fetcher::HttpFetch;
use crate::sector::normalize_sector_name;
use async_trait::async_trait;
use sectorlens_core::{BreakerPolicy, RetryPolicy, UNKNOWN};
use sectorlens_resilience::Resilience;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Breaker guarding knowledge-graph traffic.
pub const KNOWLEDGE_GRAPH_BREAKER: &str = "knowledge_graph";

const WIKIDATA_API: &str = "https://www.wikidata.org/w/api.php";

/// Industry (`P452`) first, then instance-of (`P31`).
const SECTOR_PROPERTIES: &[&str] = &["P452", "P31"];

/// Best-effort sector lookup by company name.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Sector normalized into the taxonomy, or `None` on any failure.
    async fn lookup_sector(&self, company: &str) -> Option<String>;
}

/// Disabled knowledge graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKnowledgeGraph;

#[async_trait]
impl KnowledgeGraph for NoKnowledgeGraph {
    async fn lookup_sector(&self, _company: &str) -> Option<String> {
        None
    }
}

/// Wikidata entity search plus claim inspection.
pub struct WikidataClient {
    fetcher: Arc<dyn HttpFetch>,
    resilience: Arc<Resilience>,
    retry: RetryPolicy,
    breaker_policy: BreakerPolicy,
}

impl WikidataClient {
    /// Create a client.
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        resilience: Arc<Resilience>,
        retry: RetryPolicy,
        breaker_policy: BreakerPolicy,
    ) -> Self {
        Self {
            fetcher,
            resilience,
            retry,
            breaker_policy,
        }
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        let url = Url::parse_with_params(WIKIDATA_API, params)
            .map_err(|e| WebError::Parse(e.to_string()))?;
        let page = self.fetcher.get(url.as_str()).await?;
        if page.status != 200 {
            return Err(WebError::Status {
                url: url.to_string(),
                status: page.status,
            });
        }
        serde_json::from_str(&page.body).map_err(|e| WebError::Parse(e.to_string()))
    }

    async fn search_entity(&self, company: &str) -> Result<Option<String>> {
        let json = self
            .get_json(&[
                ("action", "wbsearchentities"),
                ("search", company),
                ("language", "en"),
                ("format", "json"),
                ("type", "item"),
                ("limit", "1"),
            ])
            .await?;

        Ok(json["search"][0]["id"].as_str().map(str::to_string))
    }

    async fn label(&self, id: &str) -> Result<Option<String>> {
        let json = self
            .get_json(&[
                ("action", "wbgetentities"),
                ("ids", id),
                ("format", "json"),
                ("props", "labels"),
                ("languages", "en"),
            ])
            .await?;

        Ok(json["entities"][id]["labels"]["en"]["value"]
            .as_str()
            .map(str::to_string))
    }

    async fn query(&self, company: &str) -> Result<Option<String>> {
        let Some(id) = self.search_entity(company).await? else {
            return Ok(None);
        };

        let json = self
            .get_json(&[
                ("action", "wbgetentities"),
                ("ids", id.as_str()),
                ("format", "json"),
                ("props", "claims|labels"),
            ])
            .await?;
        let claims = &json["entities"][id.as_str()]["claims"];

        for property in SECTOR_PROPERTIES {
            for target in claim_targets(&claims[*property]) {
                if let Some(label) = self.label(&target).await? {
                    return Ok(Some(label));
                }
            }
        }
        Ok(None)
    }
}

/// Entity ids referenced by the claims of one property.
fn claim_targets(claims: &Value) -> Vec<String> {
    claims
        .as_array()
        .map(|claims| {
            claims
                .iter()
                .filter_map(|claim| claim["mainsnak"]["datavalue"]["value"]["id"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl KnowledgeGraph for WikidataClient {
    async fn lookup_sector(&self, company: &str) -> Option<String> {
        let breaker = self
            .resilience
            .breakers()
            .get_or_create(KNOWLEDGE_GRAPH_BREAKER, &self.breaker_policy);

        match self
            .resilience
            .call(&breaker, &self.retry, "www.wikidata.org", || self.query(company))
            .await
        {
            Ok(Some(label)) => {
                let sector = normalize_sector_name(&label);
                tracing::debug!(company, label = %label, sector = %sector, "Knowledge graph hit");
                (sector != UNKNOWN).then_some(sector)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::debug!(company, error = %err, "Knowledge graph lookup failed");
                None
            }
        }
    }
}
