use crate::application::dto::{
    AddBomRequest, DiffRequest, MergeOutcome, MergeRequest, RawFormat, SpdxIngestRequest,
};
use crate::bom_processing::domain::{Bom, BomMeta, BomRecord, ComponentDiff};
use crate::shared::Result;
use async_trait::async_trait;

/// BomCatalogPort - Inbound port for the catalog engine
///
/// This is the surface an upstream API layer consumes. Every ingestion
/// operation is idempotent with respect to exact-duplicate input.
#[async_trait]
pub trait BomCatalogPort: Send + Sync {
    /// Ingests a CycloneDX document
    ///
    /// # Errors
    /// Returns an error if:
    /// - The document fails sanitization or validation (nothing is persisted)
    /// - The content store or catalog rejects a write
    /// - More than one stored record matches an identity that must be unique
    async fn add_bom(&self, request: AddBomRequest) -> Result<BomRecord>;

    /// Ingests an SPDX document and stores its CycloneDX conversion
    async fn ingest_spdx(&self, request: SpdxIngestRequest) -> Result<BomRecord>;

    /// Processed content by storage uuid or serial number (latest version)
    async fn find_bom_by_id(&self, id: &str, organization: &str) -> Result<Bom>;

    async fn find_bom_by_serial_and_version(
        &self,
        serial_number: &str,
        bom_version: u32,
        organization: &str,
        raw: bool,
    ) -> Result<Bom>;

    async fn find_raw_bom(
        &self,
        id: &str,
        organization: &str,
        format: Option<RawFormat>,
    ) -> Result<Vec<u8>>;

    async fn find_boms_by_digest(&self, bom_digest: &str, organization: &str)
        -> Result<Vec<BomRecord>>;

    async fn find_bom_metas_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Vec<BomMeta>>;

    /// Merges stored BOMs without persisting the result
    async fn merge_boms(&self, request: &MergeRequest) -> Result<MergeOutcome>;

    /// Merges stored BOMs and stores the result as a new record
    async fn merge_and_store(&self, request: &MergeRequest) -> Result<BomRecord>;

    /// Compares two sets of stored BOMs; read-only
    async fn diff(&self, request: &DiffRequest) -> Result<ComponentDiff>;
}
