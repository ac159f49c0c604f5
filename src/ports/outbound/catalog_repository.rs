use crate::bom_processing::domain::{BomRecord, ConversionStatus, EnrichmentStatus, SpdxRecord};
use crate::shared::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// CatalogRepository port for catalog records
///
/// Implementations must enforce uniqueness of
/// `(organization, serial_number, bom_version)`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Inserts a new record
    ///
    /// # Errors
    /// Returns `VersionConflict` when the version is already taken
    async fn insert(&self, record: BomRecord) -> Result<BomRecord>;

    /// Replaces an existing record, matched by uuid
    async fn update(&self, record: BomRecord) -> Result<BomRecord>;

    async fn find_by_uuid(&self, uuid: &Uuid, organization: &str) -> Result<Option<BomRecord>>;

    /// All versions of a serial number, latest first.
    /// Matches with or without the `urn:uuid:` prefix.
    async fn find_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Vec<BomRecord>>;

    async fn find_by_digest(&self, bom_digest: &str, organization: &str) -> Result<Vec<BomRecord>>;

    /// Records whose enrichment status is unset, `FAILED` or `SKIPPED`,
    /// oldest first, at most `limit`.
    async fn find_needing_enrichment(&self, limit: usize) -> Result<Vec<BomRecord>>;

    async fn update_enrichment(
        &self,
        uuid: &Uuid,
        status: EnrichmentStatus,
        error: Option<String>,
    ) -> Result<()>;
}

/// SpdxRepository port for uploaded SPDX documents
#[async_trait]
pub trait SpdxRepository: Send + Sync {
    /// Creates a record
    ///
    /// # Errors
    /// Returns `VersionConflict` when `(organization, document_namespace, bom_version)` is taken
    async fn create(&self, record: SpdxRecord) -> Result<SpdxRecord>;

    /// Latest record for a document namespace
    async fn find_by_namespace(
        &self,
        document_namespace: &str,
        organization: &str,
    ) -> Result<Option<SpdxRecord>>;

    async fn find_by_uuid(&self, uuid: &Uuid) -> Result<Option<SpdxRecord>>;

    async fn find_by_converted_bom(&self, bom_uuid: &Uuid) -> Result<Option<SpdxRecord>>;

    /// Latest SPDX record whose converted catalog record has this serial number
    async fn find_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Option<SpdxRecord>>;

    async fn update_conversion_status(
        &self,
        uuid: &Uuid,
        status: ConversionStatus,
        error: Option<String>,
    ) -> Result<()>;

    async fn link_converted_bom(&self, uuid: &Uuid, bom_uuid: &Uuid) -> Result<()>;
}
