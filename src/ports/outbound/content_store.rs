use crate::bom_processing::domain::BlobReceipt;
use crate::shared::Result;
use async_trait::async_trait;

/// ContentStore port for BOM blobs
///
/// Blobs are addressed by tag (`rebom-<uuid>`, `rebom-<uuid>-raw`) and may
/// also be fetched by their `sha256:` digest.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores `content` under `tag`, replacing any previous blob with that tag
    async fn push(&self, tag: &str, content: &[u8]) -> Result<BlobReceipt>;

    /// Fetches the blob stored under `tag` (or a `sha256:` digest)
    ///
    /// # Errors
    /// Returns a `NotFound` error when nothing is stored under the key
    async fn fetch(&self, tag: &str) -> Result<Vec<u8>>;
}
