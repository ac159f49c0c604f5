use crate::application::dto::SpdxIngestRequest;
use crate::application::use_cases::add_bom::{AddBomUseCase, PreparedBom};
use crate::application::use_cases::engine_context::{storage_failure, EngineContext};
use crate::bom_processing::domain::identifiers::{generate_serial_number, spdx_blob_tag, with_urn};
use crate::bom_processing::domain::{
    Bom, BomMeta, BomRecord, BomState, ConversionStatus, SourceFormat, SpdxMetadata, SpdxRecord,
};
use crate::bom_processing::services::{compute_bom_digest, SpdxInspector};
use crate::ports::outbound::ToolInvocation;
use crate::shared::error::{RebomError, ValidationDetails};
use crate::shared::{Result, ScratchFile};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

/// IngestSpdxUseCase - stores an SPDX upload and its CycloneDX conversion
///
/// New uploads must carry a `documentNamespace` not yet used by the
/// organization; re-uploading identical content returns the converted
/// record that already exists. Updates go through an existing serial number.
#[derive(Clone)]
pub struct IngestSpdxUseCase {
    ctx: EngineContext,
    add_bom: AddBomUseCase,
}

impl IngestSpdxUseCase {
    pub fn new(ctx: EngineContext, add_bom: AddBomUseCase) -> Self {
        Self { ctx, add_bom }
    }

    pub async fn execute(&self, request: SpdxIngestRequest) -> Result<BomRecord> {
        let SpdxIngestRequest {
            document,
            organization,
            existing_serial_number,
        } = request;

        let raw = document.into_bytes()?;
        let content: Value = serde_json::from_slice(&raw).map_err(|e| RebomError::Validation {
            message: format!("SPDX document is not valid JSON: {}", e),
            details: None,
        })?;
        SpdxInspector::validate_format(&content)?;

        let metadata = SpdxInspector::extract_metadata(&content, Utc::now().timestamp_millis());
        let file_hash = SpdxInspector::file_hash(&raw);

        let mut bom_version = 1;
        if let Some(serial_number) = existing_serial_number.as_deref() {
            let prior = self
                .ctx
                .spdx_catalog
                .find_by_serial_number(serial_number, &organization)
                .await
                .map_err(storage_failure("find_spdx_by_serial_number"))?;
            match prior {
                Some(prior) if prior.file_sha256 == file_hash => {
                    tracing::info!(
                        serial_number,
                        spdx_uuid = %prior.uuid,
                        bom_version = prior.bom_version,
                        "SPDX update is identical to the latest upload, returning existing record"
                    );
                    return self
                        .resume(prior, &raw, &metadata, existing_serial_number.as_deref(), &organization)
                        .await;
                }
                Some(prior) => {
                    if let Some(pending) = self
                        .unconverted_upload(&metadata.document_namespace, &file_hash, &organization)
                        .await?
                    {
                        return self
                            .resume(pending, &raw, &metadata, existing_serial_number.as_deref(), &organization)
                            .await;
                    }
                    bom_version = prior.bom_version + 1;
                    tracing::info!(
                        serial_number,
                        previous_version = prior.bom_version,
                        bom_version,
                        "Updating SPDX artifact, incrementing version"
                    );
                }
                None => tracing::warn!(
                    serial_number,
                    "No SPDX upload behind the existing serial number, treating as a new upload"
                ),
            }
        }

        if bom_version == 1 {
            if let Some(existing) = self
                .ctx
                .spdx_catalog
                .find_by_namespace(&metadata.document_namespace, &organization)
                .await
                .map_err(storage_failure("find_spdx_by_namespace"))?
            {
                if existing.file_sha256 == file_hash {
                    tracing::warn!(
                        namespace = %metadata.document_namespace,
                        spdx_uuid = %existing.uuid,
                        "Identical SPDX document already stored, returning existing record"
                    );
                    return self
                        .resume(existing, &raw, &metadata, existing_serial_number.as_deref(), &organization)
                        .await;
                }
                return Err(RebomError::Validation {
                    message: format!(
                        "SPDX document with namespace '{}' already exists with different content; \
                         update it through its existing serial number",
                        metadata.document_namespace
                    ),
                    details: Some(ValidationDetails::field(
                        "documentNamespace",
                        "unique per organization",
                    )),
                }
                .into());
            }
        }

        let spdx_uuid = Uuid::new_v4();
        let blob = self
            .ctx
            .content_store
            .push(&spdx_blob_tag(&spdx_uuid), &raw)
            .await
            .map_err(storage_failure("push_spdx"))?;
        let now = Utc::now();
        let spdx_record = self
            .ctx
            .spdx_catalog
            .create(SpdxRecord {
                uuid: spdx_uuid,
                organization: organization.clone(),
                document_namespace: metadata.document_namespace.clone(),
                file_sha256: file_hash,
                conversion_status: ConversionStatus::Pending,
                conversion_error: None,
                converted_bom_uuid: None,
                bom_version,
                spdx_metadata: metadata.clone(),
                blob: Some(blob),
                created_date: now,
                last_updated_date: now,
            })
            .await
            .map_err(storage_failure("create_spdx"))?;

        self.convert_and_store(
            &spdx_record,
            &raw,
            &metadata,
            existing_serial_number.as_deref(),
            &organization,
        )
        .await
    }

    /// Latest upload in the namespace when it carries these exact bytes and
    /// never got a converted record.
    async fn unconverted_upload(
        &self,
        document_namespace: &str,
        file_hash: &str,
        organization: &str,
    ) -> Result<Option<SpdxRecord>> {
        let latest = self
            .ctx
            .spdx_catalog
            .find_by_namespace(document_namespace, organization)
            .await
            .map_err(storage_failure("find_spdx_by_namespace"))?;
        Ok(latest.filter(|r| r.converted_bom_uuid.is_none() && r.file_sha256 == file_hash))
    }

    /// Returns the record converted from `existing`, converting again when
    /// an earlier attempt never produced one.
    async fn resume(
        &self,
        existing: SpdxRecord,
        raw: &[u8],
        metadata: &SpdxMetadata,
        existing_serial_number: Option<&str>,
        organization: &str,
    ) -> Result<BomRecord> {
        if existing.converted_bom_uuid.is_some() {
            return self.converted_record(&existing, organization).await;
        }

        tracing::info!(
            spdx_uuid = %existing.uuid,
            status = ?existing.conversion_status,
            "SPDX upload has no converted record, retrying conversion"
        );
        self.ctx
            .spdx_catalog
            .update_conversion_status(&existing.uuid, ConversionStatus::Pending, None)
            .await
            .map_err(storage_failure("update_conversion_status"))?;
        self.convert_and_store(&existing, raw, metadata, existing_serial_number, organization)
            .await
    }

    async fn convert_and_store(
        &self,
        spdx_record: &SpdxRecord,
        raw: &[u8],
        metadata: &SpdxMetadata,
        existing_serial_number: Option<&str>,
        organization: &str,
    ) -> Result<BomRecord> {
        let mut converted = match self.convert(raw).await {
            Ok(bom) => bom,
            Err(e) => {
                self.mark_failed(&spdx_record.uuid, &e).await;
                return Err(e);
            }
        };

        let mut options = SpdxInspector::catalog_options(metadata)?;
        let serial_number = match existing_serial_number {
            Some(existing) => with_urn(existing),
            None => match converted.serial_number.as_deref().filter(|s| !s.is_empty()) {
                Some(from_converter) => with_urn(from_converter),
                None => {
                    let generated = generate_serial_number();
                    tracing::warn!(
                        serial_number = %generated,
                        "Converter output has no serial number, generated one"
                    );
                    generated
                }
            },
        };
        options.serial_number = Some(serial_number.clone());
        converted.serial_number = Some(serial_number.clone());
        converted.version = Some(spdx_record.bom_version);

        let bom_digest = compute_bom_digest(&converted)?;
        let prepared = PreparedBom {
            raw: converted.to_json_string()?.into_bytes(),
            bom: converted,
            serial_number,
            original_file_digest: spdx_record.file_sha256.clone(),
            bom_digest,
            meta: BomMeta::from_options(&options, BomState::Converted),
            source_format: SourceFormat::Spdx,
            source_spdx_uuid: Some(spdx_record.uuid),
        };

        let record = match self.add_bom.persist(prepared, organization).await {
            Ok(record) => record,
            Err(e) => {
                self.mark_failed(&spdx_record.uuid, &e).await;
                return Err(e);
            }
        };

        self.ctx
            .spdx_catalog
            .link_converted_bom(&spdx_record.uuid, &record.uuid)
            .await
            .map_err(storage_failure("link_converted_bom"))?;
        self.ctx
            .spdx_catalog
            .update_conversion_status(&spdx_record.uuid, ConversionStatus::Success, None)
            .await
            .map_err(storage_failure("update_conversion_status"))?;

        tracing::info!(
            spdx_uuid = %spdx_record.uuid,
            bom_uuid = %record.uuid,
            bom_version = record.bom_version,
            "Stored SPDX document and its CycloneDX conversion"
        );
        Ok(record)
    }

    /// Converts through the external tool, then trusts the output only after
    /// it has been through the sanitize pipeline.
    async fn convert(&self, raw: &[u8]) -> Result<Bom> {
        let input = ScratchFile::with_content(raw).await?;
        let output = ScratchFile::empty()?;
        let invocation =
            ToolInvocation::new(&self.ctx.tools.programs.convert, self.ctx.tools.timeouts.conversion)
                .args(["bomutils", "convert-spdx"])
                .arg("--infile")
                .arg(input.arg())
                .arg("--outfile")
                .arg(output.arg());

        self.ctx
            .tool_runner
            .execute(&invocation)
            .await
            .map_err(|e| conversion_error(&e))?;
        let converted = output.read().await?;
        if converted.is_empty() {
            return Err(conversion_error(&anyhow::anyhow!("converter wrote no output")));
        }
        let text = String::from_utf8(converted)
            .map_err(|e| conversion_error(&anyhow::anyhow!("converter output is not UTF-8: {}", e)))?;

        self.ctx.pipeline().process_text(&text).await
    }

    async fn mark_failed(&self, spdx_uuid: &Uuid, error: &anyhow::Error) {
        let result = self
            .ctx
            .spdx_catalog
            .update_conversion_status(spdx_uuid, ConversionStatus::Failed, Some(error.to_string()))
            .await;
        if let Err(e) = result {
            tracing::error!(spdx_uuid = %spdx_uuid, error = %e, "Could not record failed conversion");
        }
    }

    async fn converted_record(&self, existing: &SpdxRecord, organization: &str) -> Result<BomRecord> {
        if let Some(bom_uuid) = existing.converted_bom_uuid {
            let record = self
                .ctx
                .catalog
                .find_by_uuid(&bom_uuid, organization)
                .await
                .map_err(storage_failure("find_by_uuid"))?;
            if let Some(record) = record {
                return Ok(record);
            }
        }
        let spdx_id = existing.uuid.to_string();
        Err(RebomError::not_found(
            spdx_id.clone(),
            &[("spdxUuid", spdx_id.as_str()), ("organization", organization)],
        )
        .into())
    }
}

fn conversion_error(cause: &anyhow::Error) -> anyhow::Error {
    tracing::error!(error = %format!("{:#}", cause), "SPDX conversion failed");
    RebomError::Conversion {
        message: "external converter failed".to_string(),
        source_format: "SPDX".to_string(),
        target_format: "CycloneDX".to_string(),
    }
    .into()
}
