//! The web lookup seam.

use async_trait::async_trait;
use sectorlens_core::{CompanySector, Domain};
use sectorlens_web::{WebError, WebResolver};

/// Resolves a domain the local dataset could not.
///
/// Implementations are expected to cache their own answers.
#[async_trait]
pub trait DomainLookup: Send + Sync {
    /// Company and sector for `domain`.
    async fn lookup(&self, domain: &Domain) -> Result<CompanySector, WebError>;
}

#[async_trait]
impl DomainLookup for WebResolver {
    async fn lookup(&self, domain: &Domain) -> Result<CompanySector, WebError> {
        self.resolve(domain).await
    }
}
