use async_trait::async_trait;
use rebom::bom_processing::domain::BlobReceipt;
use rebom::prelude::*;

/// Mock ContentStore whose every call fails like an unreachable backend
pub struct FailingContentStore;

#[async_trait]
impl ContentStore for FailingContentStore {
    async fn push(&self, tag: &str, _content: &[u8]) -> Result<BlobReceipt> {
        anyhow::bail!("Mock push failure for {}", tag)
    }

    async fn fetch(&self, tag: &str) -> Result<Vec<u8>> {
        anyhow::bail!("Mock fetch failure for {}", tag)
    }
}
