use crate::application::dto::AddBomRequest;
use crate::application::use_cases::engine_context::{
    is_version_conflict, storage_failure, EngineContext,
};
use crate::bom_processing::domain::identifiers::{
    generate_serial_number, processed_blob_tag, raw_blob_tag, strip_urn, with_urn,
};
use crate::bom_processing::domain::{
    BlobReceipt, Bom, BomMeta, BomRecord, BomState, SourceFormat,
};
use crate::bom_processing::services::{
    attach_engine_tool, compute_bom_digest, override_root_component, sha256_hex,
    ReconcileDecision, VersionReconciler,
};
use crate::shared::error::RebomError;
use crate::shared::Result;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Attempts at reconciliation when a concurrent writer takes the version first
const MAX_RECONCILE_ATTEMPTS: usize = 3;

/// A sanitized document ready to be reconciled against the catalog.
#[derive(Debug, Clone)]
pub struct PreparedBom {
    pub bom: Bom,
    /// Bytes stored under the `-raw` tag
    pub raw: Vec<u8>,
    pub serial_number: String,
    pub original_file_digest: String,
    pub bom_digest: String,
    pub meta: BomMeta,
    pub source_format: SourceFormat,
    pub source_spdx_uuid: Option<Uuid>,
}

/// AddBomUseCase - ingests CycloneDX documents into the versioned catalog
///
/// Reconciliation of one `(organization, serialNumber)` is serialized by an
/// async lock; the repository's unique constraint covers writers outside
/// this process and triggers a bounded retry.
#[derive(Clone)]
pub struct AddBomUseCase {
    ctx: EngineContext,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AddBomUseCase {
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            locks: Arc::new(DashMap::new()),
        }
    }

    pub async fn execute(&self, request: AddBomRequest) -> Result<BomRecord> {
        let AddBomRequest {
            document,
            mut options,
            organization,
        } = request;

        let raw = document.into_bytes()?;
        let text = std::str::from_utf8(&raw)
            .map_err(|_| RebomError::validation("BOM document is not valid UTF-8"))?;
        let mut bom = self.ctx.pipeline().process_text(text).await?;
        let original_file_digest = sha256_hex(&raw);

        let serial_number = bom
            .serial_number
            .clone()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| options.serial_number.clone())
            .map(|s| with_urn(&s))
            .unwrap_or_else(generate_serial_number);
        bom.serial_number = Some(serial_number.clone());
        options.serial_number = Some(serial_number.clone());

        let state = if options.has_root_override() {
            bom = override_root_component(bom, &options, Some(Utc::now()))?;
            attach_engine_tool(&mut bom);
            BomState::Processed
        } else {
            BomState::Raw
        };

        let bom_digest = compute_bom_digest(&bom)?;
        tracing::debug!(serial_number = %serial_number, bom_digest = %bom_digest, "Computed BOM digest");

        let prepared = PreparedBom {
            bom,
            raw,
            serial_number,
            original_file_digest,
            bom_digest,
            meta: BomMeta::from_options(&options, state),
            source_format: SourceFormat::CycloneDx,
            source_spdx_uuid: None,
        };
        self.persist(prepared, &organization).await
    }

    /// Reconciles a prepared document and writes whatever the decision requires.
    pub async fn persist(&self, prepared: PreparedBom, organization: &str) -> Result<BomRecord> {
        let _guard = self.lock_serial(organization, &prepared.serial_number).await;

        let new_uuid = Uuid::new_v4();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let existing = self
                .ctx
                .catalog
                .find_by_serial_number(&prepared.serial_number, organization)
                .await
                .map_err(storage_failure("find_by_serial_number"))?;

            let decision = VersionReconciler::decide(
                &existing,
                &prepared.original_file_digest,
                &prepared.bom_digest,
                prepared.bom.version,
            )?;

            match decision {
                ReconcileDecision::Duplicate(record) => return Ok(record),
                ReconcileDecision::Update(record) => return self.replace(&prepared, record).await,
                ReconcileDecision::Insert { bom_version } => {
                    match self
                        .insert(&prepared, organization, new_uuid, bom_version)
                        .await
                    {
                        Err(e) if is_version_conflict(&e) && attempt < MAX_RECONCILE_ATTEMPTS => {
                            tracing::warn!(
                                serial_number = %prepared.serial_number,
                                bom_version,
                                attempt,
                                "Version taken by a concurrent writer, reconciling again"
                            );
                        }
                        outcome => return outcome,
                    }
                }
            }
        }
    }

    async fn insert(
        &self,
        prepared: &PreparedBom,
        organization: &str,
        uuid: Uuid,
        bom_version: u32,
    ) -> Result<BomRecord> {
        let mut record = BomRecord::new(
            prepared.serial_number.clone(),
            bom_version,
            organization,
            prepared.meta.clone(),
        );
        record.uuid = uuid;
        record.bom_digest = prepared.bom_digest.clone();
        record.original_file_digest = prepared.original_file_digest.clone();
        record.source_format = prepared.source_format;
        record.source_spdx_uuid = prepared.source_spdx_uuid;

        let (processed, raw) = self.push_blobs(&record.uuid, prepared).await?;
        record.processed_blob = Some(processed);
        record.raw_blob = Some(raw);

        let stored = self
            .ctx
            .catalog
            .insert(record)
            .await
            .map_err(storage_failure("insert"))?;
        tracing::info!(
            bom_uuid = %stored.uuid,
            serial_number = %stored.serial_number,
            bom_version = stored.bom_version,
            org = %organization,
            "Inserted catalog record"
        );
        Ok(stored)
    }

    /// Overwrites the latest record and both of its blobs in place.
    async fn replace(&self, prepared: &PreparedBom, mut record: BomRecord) -> Result<BomRecord> {
        let (processed, raw) = self.push_blobs(&record.uuid, prepared).await?;
        record.bom_digest = prepared.bom_digest.clone();
        record.original_file_digest = prepared.original_file_digest.clone();
        record.meta = prepared.meta.clone();
        record.source_format = prepared.source_format;
        record.source_spdx_uuid = prepared.source_spdx_uuid;
        record.processed_blob = Some(processed);
        record.raw_blob = Some(raw);
        record.last_updated_date = Utc::now();
        // New content has not been enriched yet.
        record.enrichment_status = None;
        record.enrichment_error = None;

        let stored = self
            .ctx
            .catalog
            .update(record)
            .await
            .map_err(storage_failure("update"))?;
        tracing::info!(
            bom_uuid = %stored.uuid,
            serial_number = %stored.serial_number,
            bom_version = stored.bom_version,
            "Replaced catalog record in place"
        );
        Ok(stored)
    }

    async fn push_blobs(
        &self,
        uuid: &Uuid,
        prepared: &PreparedBom,
    ) -> Result<(BlobReceipt, BlobReceipt)> {
        let processed_content = prepared.bom.to_json_string()?;
        let processed = self
            .ctx
            .content_store
            .push(&processed_blob_tag(uuid), processed_content.as_bytes())
            .await
            .map_err(storage_failure("push"))?;
        let raw = self
            .ctx
            .content_store
            .push(&raw_blob_tag(uuid), &prepared.raw)
            .await
            .map_err(storage_failure("push_raw"))?;
        Ok((processed, raw))
    }

    async fn lock_serial(&self, organization: &str, serial_number: &str) -> SerialGuard {
        let key = format!(
            "{}::{}",
            organization,
            strip_urn(serial_number).to_ascii_lowercase()
        );
        let lock = Arc::clone(&self.locks.entry(key.clone()).or_default());
        SerialGuard {
            guard: Some(lock.lock_owned().await),
            key,
            locks: Arc::clone(&self.locks),
        }
    }
}

/// Holds one serial number's lock; the map entry goes away with the last holder.
struct SerialGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for SerialGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
