use crate::bom_processing::domain::Bom;
use crate::bom_processing::services::BomSanitizer;
use crate::ports::outbound::SchemaValidator;
use crate::shared::error::{RebomError, ValidationDetails};
use crate::shared::Result;
use std::sync::Arc;

/// SanitizePipeline - repair, parse, validate, deduplicate, validate
///
/// Every document the engine trusts passes through here first: ingested
/// CycloneDX, converted SPDX output and merge tool output alike.
#[derive(Clone)]
pub struct SanitizePipeline {
    validator: Arc<dyn SchemaValidator>,
}

impl SanitizePipeline {
    pub fn new(validator: Arc<dyn SchemaValidator>) -> Self {
        Self { validator }
    }

    /// Runs the pipeline over serialized JSON text.
    ///
    /// # Errors
    /// `Validation` when the repaired text is not a CycloneDX document or
    /// the validator reports issues before or after deduplication
    pub async fn process_text(&self, text: &str) -> Result<Bom> {
        let repaired = BomSanitizer::sanitize_text(text);
        let bom = Bom::from_json_str(&repaired).map_err(|e| RebomError::Validation {
            message: format!("document is not a parseable CycloneDX JSON: {}", e),
            details: None,
        })?;

        self.validate(&bom).await?;
        let before = bom.components.len();
        let bom = BomSanitizer::deduplicate(bom);
        if bom.components.len() != before {
            tracing::info!(
                removed = before - bom.components.len(),
                "Removed duplicate components"
            );
        }
        self.validate(&bom).await?;
        Ok(bom)
    }

    /// Serializes an in-memory document and runs the pipeline over it.
    pub async fn process_bom(&self, bom: &Bom) -> Result<Bom> {
        let text = bom.to_json_string()?;
        self.process_text(&text).await
    }

    pub async fn validate(&self, bom: &Bom) -> Result<()> {
        match self.validator.validate(bom).await? {
            None => Ok(()),
            Some(issues) => {
                tracing::warn!(issue_count = issues.len(), "BOM failed schema validation");
                Err(RebomError::Validation {
                    message: format!("{} schema issue(s) found", issues.len()),
                    details: Some(ValidationDetails::issues(issues)),
                }
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::validation::StructuralValidator;
    use serde_json::json;

    fn pipeline() -> SanitizePipeline {
        SanitizePipeline::new(Arc::new(StructuralValidator::new()))
    }

    fn document() -> serde_json::Value {
        json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "serialNumber": "urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79",
            "version": 1,
            "components": [
                {"name": "lodash", "version": "4.17.0", "purl": "pkg:npm/lodash@4.17.0"},
                {"name": "lodash", "version": "4.17.0", "purl": "pkg:npm/lodash@4.17.0"}
            ],
            "dependencies": [{"ref": "pkg:npm/lodash@4.17.0", "dependsOn": null}],
            "x-vendor": true
        })
    }

    #[tokio::test]
    async fn test_pipeline_dedups_and_normalizes() {
        let bom = pipeline()
            .process_text(&document().to_string())
            .await
            .unwrap();
        assert_eq!(bom.components.len(), 1);
        assert!(bom.dependencies()[0].depends_on.is_empty());
        assert!(bom.extra.is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_is_idempotent() {
        let pipeline = pipeline();
        let once = pipeline
            .process_text(&document().to_string())
            .await
            .unwrap();
        let twice = pipeline.process_bom(&once).await.unwrap();
        assert_eq!(
            once.to_json_string().unwrap(),
            twice.to_json_string().unwrap()
        );
    }

    #[tokio::test]
    async fn test_pipeline_rejects_non_json() {
        let err = pipeline().process_text("not json").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RebomError>(),
            Some(RebomError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_pipeline_surfaces_validator_issues() {
        let mut doc = document();
        doc["bomFormat"] = json!("SPDX");
        let err = pipeline().process_text(&doc.to_string()).await.unwrap_err();
        match err.downcast_ref::<RebomError>() {
            Some(RebomError::Validation {
                details: Some(details),
                ..
            }) => assert!(!details.issues.is_empty()),
            other => panic!("expected validation issues, got {:?}", other),
        }
    }
}
