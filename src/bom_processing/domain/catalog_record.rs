use super::bom_options::{BomOptions, BomStructure, RootComponentMergeMode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceFormat {
    #[serde(rename = "CYCLONEDX")]
    CycloneDx,
    Spdx,
}

/// Per-record enrichment state. Records start with no status at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrichmentStatus {
    Pending,
    Completed,
    Failed,
    Skipped,
}

impl EnrichmentStatus {
    /// Whether the scheduler should pick the record up on its next cycle.
    pub fn needs_enrichment(status: Option<EnrichmentStatus>) -> bool {
        matches!(
            status,
            None | Some(EnrichmentStatus::Failed) | Some(EnrichmentStatus::Skipped)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BomState {
    #[default]
    Raw,
    Processed,
    Merged,
    Converted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BomModification {
    #[default]
    Raw,
    Tld,
    DevFiltered,
    Merged,
}

/// Descriptive metadata stored alongside a catalog record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomMeta {
    pub name: Option<String>,
    pub group: Option<String>,
    pub version: Option<String>,
    pub purl: Option<String>,
    pub belongs_to: Option<String>,
    pub hash: Option<String>,
    pub notes: Option<String>,
    pub structure: BomStructure,
    pub tld_only: bool,
    pub ignore_dev: bool,
    pub root_component_merge_mode: Option<RootComponentMergeMode>,
    pub state: BomState,
    pub modification: BomModification,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_ids: Vec<String>,
}

impl BomMeta {
    pub fn from_options(options: &BomOptions, state: BomState) -> Self {
        let modification = if options.tld_only {
            BomModification::Tld
        } else if options.ignore_dev {
            BomModification::DevFiltered
        } else if state == BomState::Merged {
            BomModification::Merged
        } else {
            BomModification::Raw
        };

        Self {
            name: options.name.clone(),
            group: options.group.clone(),
            version: options.version.clone(),
            purl: options.purl.clone(),
            belongs_to: options.belongs_to.clone(),
            hash: options.hash.clone(),
            notes: options.notes.clone(),
            structure: options.structure,
            tld_only: options.tld_only,
            ignore_dev: options.ignore_dev,
            root_component_merge_mode: options.root_component_merge_mode,
            state,
            modification,
            source_ids: Vec::new(),
        }
    }
}

/// Where a blob landed in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobReceipt {
    pub tag: String,
    pub digest: String,
    pub size: u64,
}

/// The persisted unit of storage.
///
/// `bom_version` is engine-managed and unique per `(organization, serial_number)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomRecord {
    pub uuid: Uuid,
    pub serial_number: String,
    pub bom_version: u32,
    pub organization: String,
    pub bom_digest: String,
    pub original_file_digest: String,
    pub source_format: SourceFormat,
    pub source_spdx_uuid: Option<Uuid>,
    pub meta: BomMeta,
    pub created_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
    pub enrichment_status: Option<EnrichmentStatus>,
    pub enrichment_updated_at: Option<DateTime<Utc>>,
    pub enrichment_error: Option<String>,
    pub processed_blob: Option<BlobReceipt>,
    pub raw_blob: Option<BlobReceipt>,
}

impl BomRecord {
    pub fn new(
        serial_number: impl Into<String>,
        bom_version: u32,
        organization: impl Into<String>,
        meta: BomMeta,
    ) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            serial_number: serial_number.into(),
            bom_version,
            organization: organization.into(),
            bom_digest: String::new(),
            original_file_digest: String::new(),
            source_format: SourceFormat::CycloneDx,
            source_spdx_uuid: None,
            meta,
            created_date: now,
            last_updated_date: now,
            enrichment_status: None,
            enrichment_updated_at: None,
            enrichment_error: None,
            processed_blob: None,
            raw_blob: None,
        }
    }
}

/// Tracks an uploaded SPDX document separately from its converted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxRecord {
    pub uuid: Uuid,
    pub organization: String,
    pub document_namespace: String,
    pub file_sha256: String,
    pub conversion_status: ConversionStatus,
    pub conversion_error: Option<String>,
    pub converted_bom_uuid: Option<Uuid>,
    pub bom_version: u32,
    pub spdx_metadata: super::spdx::SpdxMetadata,
    pub blob: Option<BlobReceipt>,
    pub created_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
}
