use crate::bom_processing::domain::identifiers::same_serial;
use crate::bom_processing::domain::{
    BomRecord, ConversionStatus, EnrichmentStatus, SpdxRecord,
};
use crate::ports::outbound::{CatalogRepository, SpdxRepository};
use crate::shared::error::RebomError;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// InMemoryCatalog adapter implementing both relational tables in memory
///
/// Enforces the same unique constraints a database schema would:
/// `(organization, serial_number, bom_version)` for catalog records and
/// `(organization, document_namespace, bom_version)` for SPDX records.
/// Lock order is always catalog records before SPDX records.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    records: Arc<RwLock<Vec<BomRecord>>>,
    spdx_records: Arc<RwLock<Vec<SpdxRecord>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all_records(&self) -> Vec<BomRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn insert(&self, record: BomRecord) -> Result<BomRecord> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.uuid == record.uuid) {
            return Err(RebomError::Storage {
                message: "uuid already exists".to_string(),
                operation: "insert".to_string(),
                bom_id: Some(record.uuid.to_string()),
            }
            .into());
        }
        let conflict = records.iter().any(|r| {
            r.organization == record.organization
                && r.bom_version == record.bom_version
                && same_serial(&r.serial_number, &record.serial_number)
        });
        if conflict {
            return Err(RebomError::VersionConflict {
                serial_number: record.serial_number.clone(),
                bom_version: record.bom_version,
            }
            .into());
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: BomRecord) -> Result<BomRecord> {
        let mut records = self.records.write().await;
        let Some(existing) = records.iter_mut().find(|r| r.uuid == record.uuid) else {
            return Err(RebomError::not_found(
                record.uuid.to_string(),
                &[("organization", record.organization.as_str())],
            )
            .into());
        };
        *existing = record.clone();
        Ok(record)
    }

    async fn find_by_uuid(&self, uuid: &Uuid, organization: &str) -> Result<Option<BomRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| &r.uuid == uuid && r.organization == organization)
            .cloned())
    }

    async fn find_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Vec<BomRecord>> {
        let records = self.records.read().await;
        let mut found: Vec<BomRecord> = records
            .iter()
            .filter(|r| r.organization == organization && same_serial(&r.serial_number, serial_number))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.bom_version.cmp(&a.bom_version));
        Ok(found)
    }

    async fn find_by_digest(&self, bom_digest: &str, organization: &str) -> Result<Vec<BomRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.organization == organization && r.bom_digest == bom_digest)
            .cloned()
            .collect())
    }

    async fn find_needing_enrichment(&self, limit: usize) -> Result<Vec<BomRecord>> {
        let records = self.records.read().await;
        let mut found: Vec<BomRecord> = records
            .iter()
            .filter(|r| EnrichmentStatus::needs_enrichment(r.enrichment_status))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.created_date);
        found.truncate(limit);
        Ok(found)
    }

    async fn update_enrichment(
        &self,
        uuid: &Uuid,
        status: EnrichmentStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|r| &r.uuid == uuid) else {
            return Err(RebomError::not_found(uuid.to_string(), &[]).into());
        };
        record.enrichment_status = Some(status);
        record.enrichment_error = error;
        record.enrichment_updated_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl SpdxRepository for InMemoryCatalog {
    async fn create(&self, record: SpdxRecord) -> Result<SpdxRecord> {
        let mut spdx_records = self.spdx_records.write().await;
        let conflict = spdx_records.iter().any(|r| {
            r.organization == record.organization
                && r.document_namespace == record.document_namespace
                && r.bom_version == record.bom_version
        });
        if conflict {
            return Err(RebomError::VersionConflict {
                serial_number: record.document_namespace.clone(),
                bom_version: record.bom_version,
            }
            .into());
        }
        spdx_records.push(record.clone());
        Ok(record)
    }

    async fn find_by_namespace(
        &self,
        document_namespace: &str,
        organization: &str,
    ) -> Result<Option<SpdxRecord>> {
        let spdx_records = self.spdx_records.read().await;
        Ok(spdx_records
            .iter()
            .filter(|r| r.organization == organization && r.document_namespace == document_namespace)
            .max_by_key(|r| r.bom_version)
            .cloned())
    }

    async fn find_by_uuid(&self, uuid: &Uuid) -> Result<Option<SpdxRecord>> {
        let spdx_records = self.spdx_records.read().await;
        Ok(spdx_records.iter().find(|r| &r.uuid == uuid).cloned())
    }

    async fn find_by_converted_bom(&self, bom_uuid: &Uuid) -> Result<Option<SpdxRecord>> {
        let spdx_records = self.spdx_records.read().await;
        Ok(spdx_records
            .iter()
            .find(|r| r.converted_bom_uuid.as_ref() == Some(bom_uuid))
            .cloned())
    }

    async fn find_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Option<SpdxRecord>> {
        let records = self.records.read().await;
        let converted: Vec<Uuid> = records
            .iter()
            .filter(|r| r.organization == organization && same_serial(&r.serial_number, serial_number))
            .map(|r| r.uuid)
            .collect();
        drop(records);

        let spdx_records = self.spdx_records.read().await;
        Ok(spdx_records
            .iter()
            .filter(|r| {
                r.organization == organization
                    && r.converted_bom_uuid.is_some_and(|u| converted.contains(&u))
            })
            .max_by_key(|r| r.bom_version)
            .cloned())
    }

    async fn update_conversion_status(
        &self,
        uuid: &Uuid,
        status: ConversionStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut spdx_records = self.spdx_records.write().await;
        let Some(record) = spdx_records.iter_mut().find(|r| &r.uuid == uuid) else {
            return Err(RebomError::not_found(uuid.to_string(), &[("table", "spdx")]).into());
        };
        record.conversion_status = status;
        record.conversion_error = error;
        record.last_updated_date = Utc::now();
        Ok(())
    }

    async fn link_converted_bom(&self, uuid: &Uuid, bom_uuid: &Uuid) -> Result<()> {
        let mut spdx_records = self.spdx_records.write().await;
        let Some(record) = spdx_records.iter_mut().find(|r| &r.uuid == uuid) else {
            return Err(RebomError::not_found(uuid.to_string(), &[("table", "spdx")]).into());
        };
        record.converted_bom_uuid = Some(*bom_uuid);
        record.last_updated_date = Utc::now();
        Ok(())
    }
}
