use crate::ports::outbound::{EnrichmentClient, ToolInvocation, ToolRunner};
use crate::shared::error::RebomError;
use crate::shared::{Result, ScratchFile};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Endpoint and credentials of the enrichment service.
#[derive(Clone)]
pub struct EnrichmentEndpoint {
    pub uri: String,
    pub api_key: String,
}

impl std::fmt::Debug for EnrichmentEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentEndpoint")
            .field("uri", &self.uri)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// CliEnrichmentClient adapter delegating enrichment to `rearm-cli bomutils enrich`
///
/// The tool reads the BOM from `--infile` and writes the enriched document
/// to `--outfile`; both are scratch files removed on every exit path.
pub struct CliEnrichmentClient {
    runner: Arc<dyn ToolRunner>,
    program: String,
    endpoint: EnrichmentEndpoint,
    timeout: Duration,
}

impl CliEnrichmentClient {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        program: impl Into<String>,
        endpoint: EnrichmentEndpoint,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            endpoint,
            timeout,
        }
    }
}

#[async_trait]
impl EnrichmentClient for CliEnrichmentClient {
    async fn enrich(&self, content: &[u8]) -> Result<Vec<u8>> {
        let input = ScratchFile::with_content(content).await?;
        let output = ScratchFile::empty()?;

        let invocation = ToolInvocation::new(&self.program, self.timeout)
            .args(["bomutils", "enrich"])
            .arg("--infile")
            .arg(input.arg())
            .arg("--outfile")
            .arg(output.arg())
            .arg("--bear-uri")
            .arg(&self.endpoint.uri)
            .arg("--bear-api-key")
            .arg(&self.endpoint.api_key);
        self.runner.execute(&invocation).await?;

        let enriched = output.read().await?;
        if enriched.is_empty() {
            return Err(RebomError::tool(&self.program, "enrichment produced no output").into());
        }
        serde_json::from_slice::<serde_json::Value>(&enriched).map_err(|e| {
            tracing::error!(error = %e, "Enrichment output is not JSON");
            RebomError::tool(&self.program, "enrichment output is not valid JSON")
        })?;
        Ok(enriched)
    }
}
