use crate::shared::Result;
use async_trait::async_trait;

/// EnrichmentClient port for third-party component metadata
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    /// Returns the enriched CycloneDX document for `content`
    async fn enrich(&self, content: &[u8]) -> Result<Vec<u8>>;
}
