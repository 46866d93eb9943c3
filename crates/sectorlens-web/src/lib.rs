//! Web resolution for SectorLens.
//!
//! When a domain is neither cached nor in the reference dataset, the web
//! resolver works it out from public sources:
//!
//! 1. identity queries against a search engine
//! 2. the domain's homepage, fetched once when a result points at it
//! 3. company-name extraction and weighted keyword scoring
//! 4. a follow-up sector query, then a knowledge-graph lookup
//! 5. a guess from the domain string, so the sector is never `Unknown`
//!
//! All traffic goes through the [`HttpFetch`] seam and the shared
//! [`sectorlens_resilience::Resilience`] substrate (rate limiting, circuit
//! breakers, retry).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod company_name;
pub mod error;
pub mod fetcher;
#[allow(missing_docs)]
pub mod fingerprint;
pub mod homepage;
pub mod knowledge_graph;
pub mod parser;
pub mod resolver;
pub mod search;
pub mod sector;

pub use error::{Result, WebError};
pub use fetcher::{FetchedPage, HttpFetch, ReqwestFetcher};
pub use fingerprint::BrowserProfile;
pub use homepage::{Homepage, HomepageFetcher};
pub use knowledge_graph::{KnowledgeGraph, NoKnowledgeGraph, WikidataClient};
pub use parser::{ExtractorChain, RawLink, RegexExtractor, ResultExtractor, SelectorExtractor};
pub use resolver::WebResolver;
pub use search::{SearchClient, SearchHit};
