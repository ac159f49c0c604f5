use crate::bom_processing::domain::identifiers::normalize_blob_tag;
use crate::bom_processing::domain::BlobReceipt;
use crate::bom_processing::services::sha256_hex;
use crate::ports::outbound::ContentStore;
use crate::shared::error::RebomError;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// InMemoryContentStore adapter keeping blobs in process memory
///
/// Blobs are reachable by tag and by `sha256:` digest. Used by tests and
/// by the local CLI.
#[derive(Debug, Default, Clone)]
pub struct InMemoryContentStore {
    by_tag: Arc<DashMap<String, Arc<Vec<u8>>>>,
    by_digest: Arc<DashMap<String, Arc<Vec<u8>>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn push(&self, tag: &str, content: &[u8]) -> Result<BlobReceipt> {
        let tag = normalize_blob_tag(tag);
        let digest = format!("sha256:{}", sha256_hex(content));
        let blob = Arc::new(content.to_vec());
        self.by_tag.insert(tag.clone(), Arc::clone(&blob));
        self.by_digest.insert(digest.clone(), blob);
        tracing::debug!(tag = %tag, digest = %digest, size = content.len(), "Stored blob in memory");
        Ok(BlobReceipt {
            tag,
            digest,
            size: content.len() as u64,
        })
    }

    async fn fetch(&self, tag: &str) -> Result<Vec<u8>> {
        let key = normalize_blob_tag(tag);
        let index = if key.starts_with("sha256:") {
            &self.by_digest
        } else {
            &self.by_tag
        };
        match index.get(&key) {
            Some(blob) => Ok(Vec::clone(blob.value())),
            None => Err(RebomError::not_found(key, &[("store", "memory")]).into()),
        }
    }
}
