use crate::bom_processing::domain::{
    BomOptions, SpdxCreationInfo, SpdxMetadata, SpdxPackageSummary,
};
use crate::bom_processing::services::canonicalizer::sha256_hex;
use crate::shared::error::{RebomError, ValidationDetails};
use crate::shared::Result;
use serde_json::Value;

const DEFAULT_DOCUMENT_NAME: &str = "SPDX Document";
const DEFAULT_PACKAGE_VERSION: &str = "1.0.0";

fn string_field<'a>(content: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| content.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn invalid(field: &str, constraint: &str, message: &str) -> anyhow::Error {
    RebomError::Validation {
        message: message.to_string(),
        details: Some(ValidationDetails::field(field, constraint)),
    }
    .into()
}

/// SpdxInspector checks and describes SPDX documents before conversion.
pub struct SpdxInspector;

impl SpdxInspector {
    /// Requires an ID, an `SPDX-` prefixed version and a data license.
    pub fn validate_format(content: &Value) -> Result<()> {
        if !content.is_object() {
            return Err(invalid("document", "object", "SPDX document must be a JSON object"));
        }
        if string_field(content, &["SPDXID", "spdxId"]).is_none() {
            return Err(invalid("SPDXID", "required", "SPDX document has no SPDXID"));
        }
        let Some(version) = string_field(content, &["spdxVersion", "version"]) else {
            return Err(invalid("spdxVersion", "required", "SPDX document has no spdxVersion"));
        };
        if !version.starts_with("SPDX-") {
            return Err(invalid(
                "spdxVersion",
                "prefix SPDX-",
                &format!("invalid SPDX version '{}'", version),
            ));
        }
        if string_field(content, &["dataLicense"]).is_none() {
            return Err(invalid("dataLicense", "required", "SPDX document has no dataLicense"));
        }
        Ok(())
    }

    pub fn file_hash(raw: &[u8]) -> String {
        sha256_hex(raw)
    }

    /// Extracts catalog metadata. The stored `SPDXID` is made unique per
    /// upload: `<original>-<epoch ms>-<first 8 hex of sha256(namespace)>`.
    pub fn extract_metadata(content: &Value, epoch_millis: i64) -> SpdxMetadata {
        let original_spdx_id = string_field(content, &["SPDXID", "spdxId"])
            .unwrap_or_default()
            .to_string();
        let document_namespace = string_field(content, &["documentNamespace"])
            .unwrap_or_default()
            .to_string();
        let namespace_hash = if document_namespace.is_empty() {
            "unknown".to_string()
        } else {
            sha256_hex(document_namespace.as_bytes())[..8].to_string()
        };

        let creation_info = content.get("creationInfo").map(|info| SpdxCreationInfo {
            created: string_field(info, &["created"]).map(str::to_string),
            creators: info
                .get("creators")
                .and_then(Value::as_array)
                .map(|creators| {
                    creators
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            license_list_version: string_field(info, &["licenseListVersion"]).map(str::to_string),
        });

        let packages = content
            .get("packages")
            .and_then(Value::as_array)
            .map(|packages| {
                packages
                    .iter()
                    .map(|package| SpdxPackageSummary {
                        spdx_id: string_field(package, &["SPDXID", "spdxId"]).map(str::to_string),
                        name: string_field(package, &["name"]).map(str::to_string),
                        version_info: string_field(package, &["versionInfo"]).map(str::to_string),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let document_describes = content
            .get("documentDescribes")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        SpdxMetadata {
            spdx_id: format!("{}-{}-{}", original_spdx_id, epoch_millis, namespace_hash),
            original_spdx_id,
            name: string_field(content, &["name"]).map(str::to_string),
            document_name: string_field(content, &["documentName"]).map(str::to_string),
            document_namespace,
            creation_info,
            data_license: string_field(content, &["dataLicense"]).map(str::to_string),
            spdx_version: string_field(content, &["spdxVersion", "version"]).map(str::to_string),
            document_describes,
            packages,
        }
    }

    /// Derives catalog options (name, version, hash) from SPDX metadata.
    pub fn catalog_options(metadata: &SpdxMetadata) -> Result<BomOptions> {
        let first_package = metadata.packages.first();
        let name = first_package
            .and_then(|p| p.name.clone())
            .or_else(|| metadata.document_name.clone())
            .or_else(|| metadata.name.clone())
            .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string());
        let version = first_package
            .and_then(|p| p.version_info.clone())
            .unwrap_or_else(|| DEFAULT_PACKAGE_VERSION.to_string());
        let metadata_json = serde_json::to_string(metadata)?;

        Ok(BomOptions {
            name: Some(name),
            version: Some(version),
            belongs_to: Some("application".to_string()),
            hash: Some(sha256_hex(metadata_json.as_bytes())[..16].to_string()),
            ..BomOptions::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spdx() -> Value {
        json!({
            "SPDXID": "SPDXRef-DOCUMENT",
            "spdxVersion": "SPDX-2.3",
            "dataLicense": "CC0-1.0",
            "name": "acme-backend",
            "documentNamespace": "https://acme.example/spdx/backend-1",
            "creationInfo": {
                "created": "2024-01-01T00:00:00Z",
                "creators": ["Tool: syft-1.0"],
                "licenseListVersion": "3.21"
            },
            "documentDescribes": ["SPDXRef-Package-backend"],
            "packages": [
                { "SPDXID": "SPDXRef-Package-backend", "name": "backend", "versionInfo": "2.1.0" }
            ]
        })
    }

    #[test]
    fn test_validate_format_accepts_valid_document() {
        assert!(SpdxInspector::validate_format(&spdx()).is_ok());
    }

    #[test]
    fn test_validate_format_rejects_missing_fields() {
        for field in ["SPDXID", "spdxVersion", "dataLicense"] {
            let mut doc = spdx();
            doc.as_object_mut().unwrap().remove(field);
            let err = SpdxInspector::validate_format(&doc).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<RebomError>(), Some(RebomError::Validation { .. })),
                "missing {} should fail",
                field
            );
        }
    }

    #[test]
    fn test_validate_format_rejects_bad_version_prefix() {
        let mut doc = spdx();
        doc["spdxVersion"] = json!("2.3");
        assert!(SpdxInspector::validate_format(&doc).is_err());
    }

    #[test]
    fn test_extract_metadata_uniquifies_spdx_id() {
        let metadata = SpdxInspector::extract_metadata(&spdx(), 1_700_000_000_000);
        assert_eq!(metadata.original_spdx_id, "SPDXRef-DOCUMENT");
        let expected_suffix = &sha256_hex(b"https://acme.example/spdx/backend-1")[..8];
        assert_eq!(
            metadata.spdx_id,
            format!("SPDXRef-DOCUMENT-1700000000000-{}", expected_suffix)
        );
        assert_eq!(metadata.packages.len(), 1);
        assert_eq!(metadata.creation_info.unwrap().creators, vec!["Tool: syft-1.0"]);
        assert_eq!(metadata.document_describes, vec!["SPDXRef-Package-backend"]);
    }

    #[test]
    fn test_catalog_options_from_first_package() {
        let metadata = SpdxInspector::extract_metadata(&spdx(), 1);
        let options = SpdxInspector::catalog_options(&metadata).unwrap();
        assert_eq!(options.name.as_deref(), Some("backend"));
        assert_eq!(options.version.as_deref(), Some("2.1.0"));
        assert_eq!(options.hash.as_ref().map(String::len), Some(16));
    }

    #[test]
    fn test_catalog_options_defaults() {
        let options = SpdxInspector::catalog_options(&SpdxMetadata::default()).unwrap();
        assert_eq!(options.name.as_deref(), Some("SPDX Document"));
        assert_eq!(options.version.as_deref(), Some("1.0.0"));
    }
}
