use crate::bom_processing::domain::identifiers::normalize_blob_tag;
use crate::bom_processing::domain::BlobReceipt;
use crate::bom_processing::services::sha256_hex;
use crate::ports::outbound::ContentStore;
use crate::shared::error::RebomError;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PushResponse {
    #[serde(default)]
    oci_response: Option<OciResponse>,
    #[serde(rename = "fileSHA256Digest", default)]
    file_sha256_digest: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OciResponse {
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    size: Option<Value>,
}

/// Connection settings for the OCI artifact service.
#[derive(Debug, Clone)]
pub struct ArtifactServiceSettings {
    pub base_url: String,
    pub registry: String,
    pub repository: String,
    pub max_retries: u32,
}

/// ArtifactServiceStore adapter pushing and pulling blobs through an
/// OCI artifact service (`/push` multipart, `/pull` query)
pub struct ArtifactServiceStore {
    client: reqwest::Client,
    settings: ArtifactServiceSettings,
}

impl ArtifactServiceStore {
    pub fn new(settings: ArtifactServiceSettings) -> Result<Self> {
        let user_agent = format!("rebom/{}", env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            settings: ArtifactServiceSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                max_retries: settings.max_retries.max(1),
                ..settings
            },
        })
    }

    fn pull_url(&self, tag: &str) -> String {
        format!(
            "{}/pull?registry={}&repo={}&tag={}",
            self.settings.base_url,
            urlencoding::encode(&self.settings.registry),
            urlencoding::encode(&self.settings.repository),
            urlencoding::encode(tag)
        )
    }

    /// Retries transient failures with a short linear backoff; a missing blob is not retried.
    async fn with_retry<T, F, Fut>(&self, operation: &str, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.settings.max_retries {
            match attempt_fn().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if matches!(
                        e.downcast_ref::<RebomError>(),
                        Some(RebomError::NotFound { .. })
                    ) {
                        return Err(e);
                    }
                    tracing::warn!(operation, attempt, error = %e, "Artifact service request failed");
                    last_error = Some(e);
                    if attempt < self.settings.max_retries {
                        tokio::time::sleep(retry_delay(attempt)).await;
                    }
                }
            }
        }

        let cause = last_error
            .map(|e| format!("{:#}", e))
            .unwrap_or_else(|| "no attempts made".to_string());
        tracing::error!(operation, cause = %cause, "Artifact service request gave up");
        Err(RebomError::storage(operation, "artifact service unavailable").into())
    }

    async fn push_once(&self, tag: &str, content: &[u8]) -> Result<PushResponse> {
        let file = reqwest::multipart::Part::bytes(content.to_vec())
            .file_name("file.json")
            .mime_str("application/json")?;
        let form = reqwest::multipart::Form::new()
            .text("registry", self.settings.registry.clone())
            .text("repo", self.settings.repository.clone())
            .text("tag", tag.to_string())
            .part("file", file);

        let response = self
            .client
            .post(format!("{}/push", self.settings.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("artifact service push returned status {}", response.status());
        }
        Ok(response.json().await?)
    }

    async fn fetch_once(&self, tag: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.pull_url(tag))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RebomError::not_found(tag, &[("store", "artifact-service")]).into());
        }
        if !response.status().is_success() {
            anyhow::bail!("artifact service pull returned status {}", response.status());
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentStore for ArtifactServiceStore {
    async fn push(&self, tag: &str, content: &[u8]) -> Result<BlobReceipt> {
        let tag = normalize_blob_tag(tag);
        let response = self
            .with_retry("push", || self.push_once(&tag, content))
            .await?;

        let oci = response.oci_response.unwrap_or_default();
        let digest = oci
            .digest
            .or(response.file_sha256_digest)
            .unwrap_or_else(|| format!("sha256:{}", sha256_hex(content)));
        let size = match oci.size {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
        .unwrap_or(content.len() as u64);

        tracing::debug!(tag = %tag, digest = %digest, size, "Pushed blob to artifact service");
        Ok(BlobReceipt { tag, digest, size })
    }

    async fn fetch(&self, tag: &str) -> Result<Vec<u8>> {
        let tag = normalize_blob_tag(tag);
        self.with_retry("fetch", || self.fetch_once(&tag)).await
    }
}

/// Linear backoff between attempts: 100ms, 200ms, 300ms, ...
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(100 * u64::from(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str) -> ArtifactServiceSettings {
        ArtifactServiceSettings {
            base_url: base_url.to_string(),
            registry: "registry.example.com".to_string(),
            repository: "acme/rebom-artifacts".to_string(),
            max_retries: 1,
        }
    }

    #[test]
    fn test_pull_url_encodes_parameters() {
        let store = ArtifactServiceStore::new(settings("http://localhost:8083/")).unwrap();
        assert_eq!(
            store.pull_url("rebom-abc"),
            "http://localhost:8083/pull?registry=registry.example.com&repo=acme%2Frebom-artifacts&tag=rebom-abc"
        );
    }

    #[test]
    fn test_retry_delay_grows_linearly() {
        assert_eq!(retry_delay(1), Duration::from_millis(100));
        assert_eq!(retry_delay(2), Duration::from_millis(200));
        assert_eq!(retry_delay(3), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_storage_error() {
        let store = ArtifactServiceStore::new(settings("http://127.0.0.1:9")).unwrap();
        let err = store.push("abc", b"{}").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RebomError>(),
            Some(RebomError::Storage { .. })
        ));
    }
}
