use crate::adapters::outbound::enrichment::{CliEnrichmentClient, EnrichmentEndpoint};
use crate::adapters::outbound::process::SubprocessToolRunner;
use crate::adapters::outbound::storage::{
    ArtifactServiceSettings, ArtifactServiceStore, InMemoryCatalog, InMemoryContentStore,
};
use crate::adapters::outbound::validation::{CycloneDxCliValidator, StructuralValidator};
use crate::application::catalog_service::CatalogService;
use crate::application::scheduler::{EnrichmentScheduler, SchedulerSettings};
use crate::application::use_cases::EngineContext;
use crate::config::EngineConfig;
use crate::ports::outbound::{
    CatalogRepository, ContentStore, EnrichmentClient, SchemaValidator, SpdxRepository,
    ToolRunner,
};
use crate::shared::Result;
use std::sync::Arc;
use std::time::Duration;

/// A fully wired engine.
pub struct Engine {
    pub service: CatalogService,
    pub scheduler: Arc<EnrichmentScheduler>,
    pub context: EngineContext,
}

/// Factory for wiring the engine from configuration
///
/// Adapter selection happens here and only here: the use cases never look
/// at configuration or the environment.
pub struct EngineFactory;

impl EngineFactory {
    /// Builds an engine over an in-memory catalog and real subprocess tools.
    pub fn build(config: &EngineConfig) -> Result<Engine> {
        let catalog = InMemoryCatalog::new();
        Self::build_with(
            config,
            Arc::new(catalog.clone()),
            Arc::new(catalog),
            Arc::new(SubprocessToolRunner::with_concurrency(
                config.tools.max_concurrent,
            )),
        )
    }

    /// Builds an engine over the given repositories and tool runner.
    pub fn build_with(
        config: &EngineConfig,
        catalog: Arc<dyn CatalogRepository>,
        spdx_catalog: Arc<dyn SpdxRepository>,
        tool_runner: Arc<dyn ToolRunner>,
    ) -> Result<Engine> {
        let content_store = Self::content_store(config)?;
        let validator = Self::validator(config, Arc::clone(&tool_runner));
        let enrichment_client = Self::enrichment_client(config, Arc::clone(&tool_runner));

        let context = EngineContext {
            catalog: Arc::clone(&catalog),
            spdx_catalog,
            content_store: Arc::clone(&content_store),
            validator,
            tool_runner,
            tools: config.tool_settings(),
        };

        let scheduler = Arc::new(EnrichmentScheduler::new(
            catalog,
            content_store,
            enrichment_client,
            SchedulerSettings {
                interval: Duration::from_secs(config.enrichment.interval_secs),
                batch_size: config.enrichment.batch_size,
            },
        ));

        Ok(Engine {
            service: CatalogService::new(context.clone()),
            scheduler,
            context,
        })
    }

    fn content_store(config: &EngineConfig) -> Result<Arc<dyn ContentStore>> {
        match config.content_store.artifact_service_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                tracing::info!(url, "Using artifact service content store");
                let store = ArtifactServiceStore::new(ArtifactServiceSettings {
                    base_url: url.to_string(),
                    registry: config.content_store.registry.clone(),
                    repository: config.content_store.repository.clone(),
                    max_retries: config.content_store.max_retries,
                })?;
                Ok(Arc::new(store))
            }
            _ => {
                tracing::debug!("Using in-memory content store");
                Ok(Arc::new(InMemoryContentStore::new()))
            }
        }
    }

    fn validator(config: &EngineConfig, runner: Arc<dyn ToolRunner>) -> Arc<dyn SchemaValidator> {
        if config.tools.external_validation {
            Arc::new(CycloneDxCliValidator::new(
                runner,
                config.tools.validate.clone(),
                Duration::from_secs(config.timeouts.validation),
            ))
        } else {
            Arc::new(StructuralValidator::new())
        }
    }

    fn enrichment_client(
        config: &EngineConfig,
        runner: Arc<dyn ToolRunner>,
    ) -> Option<Arc<dyn EnrichmentClient>> {
        let uri = config
            .enrichment
            .endpoint
            .as_deref()
            .filter(|u| !u.trim().is_empty())?;
        let api_key = config
            .enrichment
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())?;
        Some(Arc::new(CliEnrichmentClient::new(
            runner,
            config.tools.enrich.clone(),
            EnrichmentEndpoint {
                uri: uri.to_string(),
                api_key: api_key.to_string(),
            },
            Duration::from_secs(config.timeouts.enrichment),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOverrides;

    #[test]
    fn test_default_config_builds_disabled_scheduler() {
        let engine = EngineFactory::build(&EngineConfig::default()).unwrap();
        assert!(!engine.scheduler.is_enabled());
    }

    #[test]
    fn test_enrichment_endpoint_enables_scheduler() {
        let config = EngineConfig::default()
            .with_overrides(ConfigOverrides {
                enrichment_uri: Some("https://bear.example".to_string()),
                enrichment_api_key: Some("key".to_string()),
                ..ConfigOverrides::default()
            })
            .unwrap();
        let engine = EngineFactory::build(&config).unwrap();
        assert!(engine.scheduler.is_enabled());
    }
}
