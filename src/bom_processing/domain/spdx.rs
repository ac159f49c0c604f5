use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxCreationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_list_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxPackageSummary {
    #[serde(rename = "SPDXID", default, skip_serializing_if = "Option::is_none")]
    pub spdx_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_info: Option<String>,
}

/// Metadata extracted from an SPDX document for catalog storage.
///
/// `spdx_id` is uniquified per upload; `original_spdx_id` keeps the
/// document's own identifier for traceability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxMetadata {
    #[serde(rename = "SPDXID")]
    pub spdx_id: String,
    #[serde(rename = "originalSPDXID")]
    pub original_spdx_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(default)]
    pub document_namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_info: Option<SpdxCreationInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spdx_version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_describes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<SpdxPackageSummary>,
}
