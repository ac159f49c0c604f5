use crate::bom_processing::domain::BomOptions;
use serde_json::Value;

/// A document as handed to the engine.
///
/// Raw bytes are preferred: the original file digest is computed over them
/// exactly as received. A parsed value is serialized first.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Raw(Vec<u8>),
    Json(Value),
}

impl DocumentInput {
    pub fn into_bytes(self) -> crate::shared::Result<Vec<u8>> {
        match self {
            DocumentInput::Raw(bytes) => Ok(bytes),
            DocumentInput::Json(value) => Ok(serde_json::to_vec(&value)?),
        }
    }
}

impl From<Vec<u8>> for DocumentInput {
    fn from(bytes: Vec<u8>) -> Self {
        DocumentInput::Raw(bytes)
    }
}

impl From<Value> for DocumentInput {
    fn from(value: Value) -> Self {
        DocumentInput::Json(value)
    }
}

/// Request parameters for CycloneDX ingestion
#[derive(Debug, Clone)]
pub struct AddBomRequest {
    pub document: DocumentInput,
    pub options: BomOptions,
    pub organization: String,
}

impl AddBomRequest {
    pub fn new(
        document: impl Into<DocumentInput>,
        options: BomOptions,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            options,
            organization: organization.into(),
        }
    }
}

/// Request parameters for SPDX ingestion
///
/// `existing_serial_number` selects the update path: the upload becomes the
/// next version of the record lineage behind that serial number.
#[derive(Debug, Clone)]
pub struct SpdxIngestRequest {
    pub document: DocumentInput,
    pub organization: String,
    pub existing_serial_number: Option<String>,
}

impl SpdxIngestRequest {
    pub fn new(document: impl Into<DocumentInput>, organization: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            organization: organization.into(),
            existing_serial_number: None,
        }
    }

    pub fn updating(mut self, serial_number: impl Into<String>) -> Self {
        self.existing_serial_number = Some(serial_number.into());
        self
    }
}

/// Which raw form `find_raw_bom` should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawFormat {
    CycloneDx,
    Spdx,
}

impl std::str::FromStr for RawFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CYCLONEDX" => Ok(RawFormat::CycloneDx),
            "SPDX" => Ok(RawFormat::Spdx),
            _ => Err(format!(
                "Invalid raw format: '{}'. Valid values are: CYCLONEDX, SPDX",
                s
            )),
        }
    }
}
