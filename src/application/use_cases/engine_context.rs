use crate::application::dto::ToolSettings;
use crate::application::use_cases::sanitize_pipeline::SanitizePipeline;
use crate::ports::outbound::{
    CatalogRepository, ContentStore, SchemaValidator, SpdxRepository, ToolRunner,
};
use crate::shared::error::RebomError;
use std::sync::Arc;

/// Collaborators shared by every use case.
///
/// All seams are trait objects so the same context can be handed to
/// request handlers and to the background scheduler.
#[derive(Clone)]
pub struct EngineContext {
    pub catalog: Arc<dyn CatalogRepository>,
    pub spdx_catalog: Arc<dyn SpdxRepository>,
    pub content_store: Arc<dyn ContentStore>,
    pub validator: Arc<dyn SchemaValidator>,
    pub tool_runner: Arc<dyn ToolRunner>,
    pub tools: ToolSettings,
}

impl EngineContext {
    pub fn pipeline(&self) -> SanitizePipeline {
        SanitizePipeline::new(Arc::clone(&self.validator))
    }
}

/// Wraps an unclassified persistence failure as a `Storage` error.
///
/// Errors that already carry a kind (`NotFound`, `VersionConflict`, ...)
/// pass through so callers can still match on them.
pub(crate) fn storage_failure(operation: &'static str) -> impl Fn(anyhow::Error) -> anyhow::Error {
    move |error| {
        if error.downcast_ref::<RebomError>().is_some() {
            return error;
        }
        tracing::error!(operation, error = %format!("{:#}", error), "Storage operation failed");
        RebomError::storage(operation, error.to_string()).into()
    }
}

pub(crate) fn is_version_conflict(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<RebomError>(),
        Some(RebomError::VersionConflict { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_failure_wraps_plain_errors() {
        let wrapped = storage_failure("push")(anyhow::anyhow!("connection reset"));
        match wrapped.downcast_ref::<RebomError>() {
            Some(RebomError::Storage { operation, .. }) => assert_eq!(operation, "push"),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_failure_keeps_classified_errors() {
        let original: anyhow::Error = RebomError::VersionConflict {
            serial_number: "urn:uuid:1".to_string(),
            bom_version: 2,
        }
        .into();
        let passed = storage_failure("insert")(original);
        assert!(is_version_conflict(&passed));
    }
}
