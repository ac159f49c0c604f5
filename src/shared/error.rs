use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Exit codes for the CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (validation, storage, tool failure, file I/O, etc.)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Field-level detail attached to a validation failure.
///
/// These are safe to surface to API callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

impl ValidationDetails {
    pub fn field(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            constraint: Some(constraint.into()),
            issues: Vec::new(),
        }
    }

    pub fn issues(issues: Vec<String>) -> Self {
        Self {
            field: None,
            constraint: None,
            issues,
        }
    }
}

/// Engine errors that cross the API boundary with a machine-readable kind.
///
/// Functions return `anyhow::Result`; these values are raised with `.into()` and
/// classified again with `downcast_ref::<RebomError>()`.
#[derive(Debug, Error)]
pub enum RebomError {
    #[error("BOM validation failed: {message}")]
    Validation {
        message: String,
        details: Option<ValidationDetails>,
    },

    #[error("BOM storage failure during {operation}: {message}")]
    Storage {
        message: String,
        operation: String,
        bom_id: Option<String>,
    },

    #[error("{message}")]
    NotFound {
        message: String,
        identifier: String,
        criteria: BTreeMap<String, String>,
    },

    #[error("Conversion from {source_format} to {target_format} failed: {message}")]
    Conversion {
        message: String,
        source_format: String,
        target_format: String,
    },

    #[error("BOM merge failed: {message}")]
    Merge {
        message: String,
        bom_ids: Vec<String>,
    },

    #[error("External tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Data integrity violation: {count} records match '{identifier}'")]
    DataIntegrity {
        identifier: String,
        count: usize,
        context: BTreeMap<String, String>,
    },

    #[error("Version {bom_version} of {serial_number} was written concurrently")]
    VersionConflict {
        serial_number: String,
        bom_version: u32,
    },
}

impl RebomError {
    pub fn validation(message: impl Into<String>) -> Self {
        RebomError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        RebomError::Storage {
            message: message.into(),
            operation: operation.into(),
            bom_id: None,
        }
    }

    pub fn not_found(identifier: impl Into<String>, criteria: &[(&str, &str)]) -> Self {
        let identifier = identifier.into();
        RebomError::NotFound {
            message: format!("BOM not found: {}", identifier),
            identifier,
            criteria: criteria
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        RebomError::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RebomError::Validation { .. } => ErrorCode::BomValidation,
            RebomError::Storage { .. } => ErrorCode::BomStorage,
            RebomError::NotFound { .. } => ErrorCode::BomNotFound,
            RebomError::Conversion { .. } => ErrorCode::BomConversion,
            RebomError::Merge { .. } => ErrorCode::BomMerge,
            RebomError::Tool { .. } => ErrorCode::BomTool,
            RebomError::DataIntegrity { .. } => ErrorCode::BomDataIntegrity,
            RebomError::VersionConflict { .. } => ErrorCode::BomVersionConflict,
        }
    }
}

/// Machine-readable error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    #[serde(rename = "BOM_VALIDATION_ERROR")]
    BomValidation,
    #[serde(rename = "BOM_STORAGE_ERROR")]
    BomStorage,
    BomNotFound,
    #[serde(rename = "BOM_CONVERSION_ERROR")]
    BomConversion,
    #[serde(rename = "BOM_MERGE_ERROR")]
    BomMerge,
    #[serde(rename = "BOM_TOOL_ERROR")]
    BomTool,
    #[serde(rename = "BOM_DATA_INTEGRITY_ERROR")]
    BomDataIntegrity,
    BomVersionConflict,
    InternalError,
}

impl ErrorCode {
    /// Classifies any error produced by the engine.
    pub fn of(error: &anyhow::Error) -> Self {
        error
            .downcast_ref::<RebomError>()
            .map(RebomError::code)
            .unwrap_or(ErrorCode::InternalError)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::BomValidation => "BOM_VALIDATION_ERROR",
            ErrorCode::BomStorage => "BOM_STORAGE_ERROR",
            ErrorCode::BomNotFound => "BOM_NOT_FOUND",
            ErrorCode::BomConversion => "BOM_CONVERSION_ERROR",
            ErrorCode::BomMerge => "BOM_MERGE_ERROR",
            ErrorCode::BomTool => "BOM_TOOL_ERROR",
            ErrorCode::BomDataIntegrity => "BOM_DATA_INTEGRITY_ERROR",
            ErrorCode::BomVersionConflict => "BOM_VERSION_CONFLICT",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error shape handed to an upstream API layer.
///
/// Internal causes (tool stderr, storage driver messages) stay in the logs;
/// only identifiers and validation details are carried here.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn from_error(error: &anyhow::Error) -> Self {
        let Some(rebom_error) = error.downcast_ref::<RebomError>() else {
            let chain = format!("{:#}", error);
            tracing::error!(error = %chain, "Unclassified engine error");
            return Self {
                code: ErrorCode::InternalError,
                message: "An unexpected error occurred".to_string(),
                details: None,
            };
        };

        let (message, details) = match rebom_error {
            RebomError::Validation { details, .. } => (
                rebom_error.to_string(),
                details.as_ref().map(|d| json!(d)),
            ),
            RebomError::Storage {
                operation, bom_id, ..
            } => {
                tracing::error!(error = %rebom_error, "Storage error reported to caller");
                (
                    "BOM storage operation failed".to_string(),
                    Some(json!({ "operation": operation, "bomId": bom_id })),
                )
            }
            RebomError::NotFound {
                identifier,
                criteria,
                ..
            } => (
                rebom_error.to_string(),
                Some(json!({ "bomId": identifier, "searchCriteria": criteria })),
            ),
            RebomError::Conversion {
                source_format,
                target_format,
                ..
            } => {
                tracing::error!(error = %rebom_error, "Conversion error reported to caller");
                (
                    format!("Conversion from {} to {} failed", source_format, target_format),
                    Some(json!({ "sourceFormat": source_format, "targetFormat": target_format })),
                )
            }
            RebomError::Merge { bom_ids, .. } => {
                tracing::error!(error = %rebom_error, "Merge error reported to caller");
                (
                    "BOM merge failed".to_string(),
                    Some(json!({ "bomIds": bom_ids })),
                )
            }
            RebomError::Tool { tool, .. } => {
                tracing::error!(error = %rebom_error, "Tool error reported to caller");
                (
                    format!("External tool '{}' failed", tool),
                    Some(json!({ "tool": tool })),
                )
            }
            RebomError::DataIntegrity {
                identifier,
                count,
                context,
            } => (
                rebom_error.to_string(),
                Some(json!({ "identifier": identifier, "count": count, "context": context })),
            ),
            RebomError::VersionConflict {
                serial_number,
                bom_version,
            } => (
                rebom_error.to_string(),
                Some(json!({ "serialNumber": serial_number, "bomVersion": bom_version })),
            ),
        };

        Self {
            code: rebom_error.code(),
            message,
            details,
        }
    }
}
