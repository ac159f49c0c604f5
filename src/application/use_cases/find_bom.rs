use crate::application::dto::RawFormat;
use crate::application::use_cases::engine_context::{storage_failure, EngineContext};
use crate::bom_processing::domain::identifiers::{processed_blob_tag, raw_blob_tag};
use crate::bom_processing::domain::{Bom, BomMeta, BomRecord};
use crate::shared::error::RebomError;
use crate::shared::Result;
use std::collections::BTreeMap;
use uuid::Uuid;

/// FindBomUseCase - resolves identifiers to catalog records and their content
#[derive(Clone)]
pub struct FindBomUseCase {
    ctx: EngineContext,
}

impl FindBomUseCase {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Resolves a storage uuid, falling back to the latest record of a serial number.
    pub async fn resolve_record(&self, id: &str, organization: &str) -> Result<BomRecord> {
        if let Ok(uuid) = Uuid::parse_str(id) {
            let found = self
                .ctx
                .catalog
                .find_by_uuid(&uuid, organization)
                .await
                .map_err(storage_failure("find_by_uuid"))?;
            if let Some(record) = found {
                return Ok(record);
            }
        }

        let versions = self
            .ctx
            .catalog
            .find_by_serial_number(id, organization)
            .await
            .map_err(storage_failure("find_by_serial_number"))?;
        versions.into_iter().next().ok_or_else(|| {
            RebomError::not_found(id, &[("organization", organization), ("id", id)]).into()
        })
    }

    pub async fn find_bom_by_id(&self, id: &str, organization: &str) -> Result<Bom> {
        let record = self.resolve_record(id, organization).await?;
        self.load_document(&record, false).await
    }

    /// Fetches one engine-managed version of a serial number.
    ///
    /// # Errors
    /// `NotFound` when the version does not exist, `DataIntegrity` when more
    /// than one record claims it
    pub async fn find_bom_by_serial_and_version(
        &self,
        serial_number: &str,
        bom_version: u32,
        organization: &str,
        raw: bool,
    ) -> Result<Bom> {
        let versions = self
            .ctx
            .catalog
            .find_by_serial_number(serial_number, organization)
            .await
            .map_err(storage_failure("find_by_serial_number"))?;
        let matching: Vec<&BomRecord> = versions
            .iter()
            .filter(|r| r.bom_version == bom_version)
            .collect();

        match matching.as_slice() {
            [] => {
                let version = bom_version.to_string();
                Err(RebomError::not_found(
                    serial_number,
                    &[
                        ("serialNumber", serial_number),
                        ("bomVersion", version.as_str()),
                        ("organization", organization),
                    ],
                )
                .into())
            }
            [record] => self.load_document(record, raw).await,
            many => Err(RebomError::DataIntegrity {
                identifier: serial_number.to_string(),
                count: many.len(),
                context: BTreeMap::from([
                    ("bomVersion".to_string(), bom_version.to_string()),
                    ("organization".to_string(), organization.to_string()),
                ]),
            }
            .into()),
        }
    }

    /// Returns stored raw bytes: the untransformed CycloneDX input, or the
    /// original SPDX upload for records converted from SPDX.
    ///
    /// Without a format the SPDX source wins when there is one.
    pub async fn find_raw_bom(
        &self,
        id: &str,
        organization: &str,
        format: Option<RawFormat>,
    ) -> Result<Vec<u8>> {
        let record = self.resolve_record(id, organization).await?;
        let wants_spdx = match format {
            Some(RawFormat::Spdx) => true,
            Some(RawFormat::CycloneDx) => false,
            None => record.source_spdx_uuid.is_some(),
        };

        if !wants_spdx {
            return self.fetch_raw_bytes(&record).await;
        }

        let spdx_uuid = record.source_spdx_uuid.ok_or_else(|| {
            RebomError::not_found(
                id,
                &[("organization", organization), ("format", "SPDX")],
            )
        })?;
        let spdx_record = self
            .ctx
            .spdx_catalog
            .find_by_uuid(&spdx_uuid)
            .await
            .map_err(storage_failure("find_spdx_by_uuid"))?
            .ok_or_else(|| {
                let spdx_id = spdx_uuid.to_string();
                RebomError::not_found(spdx_id.clone(), &[("spdxUuid", spdx_id.as_str())])
            })?;
        let tag = spdx_record
            .blob
            .map(|b| b.tag)
            .ok_or_else(|| RebomError::storage("fetch_spdx", "SPDX record has no stored blob"))?;
        self.ctx
            .content_store
            .fetch(&tag)
            .await
            .map_err(storage_failure("fetch_spdx"))
    }

    pub async fn find_boms_by_digest(
        &self,
        bom_digest: &str,
        organization: &str,
    ) -> Result<Vec<BomRecord>> {
        self.ctx
            .catalog
            .find_by_digest(bom_digest, organization)
            .await
            .map_err(storage_failure("find_by_digest"))
    }

    /// Metadata of every version of a serial number, latest first.
    pub async fn find_bom_metas_by_serial_number(
        &self,
        serial_number: &str,
        organization: &str,
    ) -> Result<Vec<BomMeta>> {
        let versions = self
            .ctx
            .catalog
            .find_by_serial_number(serial_number, organization)
            .await
            .map_err(storage_failure("find_by_serial_number"))?;
        Ok(versions.into_iter().map(|r| r.meta).collect())
    }

    pub(crate) async fn load_document(&self, record: &BomRecord, raw: bool) -> Result<Bom> {
        let bytes = if raw {
            self.fetch_raw_bytes(record).await?
        } else {
            self.fetch_processed_bytes(record).await?
        };
        serde_json::from_slice::<Bom>(&bytes).map_err(|e| {
            tracing::error!(bom_uuid = %record.uuid, error = %e, "Stored blob is not a CycloneDX document");
            RebomError::Storage {
                message: "stored content is not a CycloneDX document".to_string(),
                operation: "fetch".to_string(),
                bom_id: Some(record.uuid.to_string()),
            }
            .into()
        })
    }

    pub(crate) async fn fetch_processed_bytes(&self, record: &BomRecord) -> Result<Vec<u8>> {
        let tag = record
            .processed_blob
            .as_ref()
            .map(|b| b.tag.clone())
            .unwrap_or_else(|| processed_blob_tag(&record.uuid));
        self.ctx
            .content_store
            .fetch(&tag)
            .await
            .map_err(storage_failure("fetch"))
    }

    /// Raw content, falling back to the processed blob for records stored
    /// before raw blobs were kept separately.
    async fn fetch_raw_bytes(&self, record: &BomRecord) -> Result<Vec<u8>> {
        let tag = record
            .raw_blob
            .as_ref()
            .map(|b| b.tag.clone())
            .unwrap_or_else(|| raw_blob_tag(&record.uuid));
        match self.ctx.content_store.fetch(&tag).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                tracing::warn!(
                    bom_uuid = %record.uuid,
                    tag = %tag,
                    error = %e,
                    "Raw blob unavailable, falling back to processed content"
                );
                self.fetch_processed_bytes(record).await
            }
        }
    }
}
