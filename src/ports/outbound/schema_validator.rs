use crate::bom_processing::domain::Bom;
use crate::shared::Result;
use async_trait::async_trait;

/// SchemaValidator port for CycloneDX schema checks
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    /// Returns `None` when the BOM is valid, or the list of validation issues
    ///
    /// # Errors
    /// Only when the validator itself cannot run
    async fn validate(&self, bom: &Bom) -> Result<Option<Vec<String>>>;
}
