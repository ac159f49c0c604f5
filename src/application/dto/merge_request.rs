use crate::bom_processing::domain::{Bom, BomOptions};

/// Request parameters for merging stored BOMs
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Storage uuids or serial numbers
    pub ids: Vec<String>,
    pub options: BomOptions,
    pub organization: String,
}

impl MergeRequest {
    pub fn new(ids: Vec<String>, options: BomOptions, organization: impl Into<String>) -> Self {
        Self {
            ids,
            options,
            organization: organization.into(),
        }
    }
}

/// Merged document plus anything the caller should know about how it was built
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub bom: Bom,
    pub warnings: Vec<String>,
}

/// Request parameters for comparing two sets of stored BOMs
#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub from_ids: Vec<String>,
    pub to_ids: Vec<String>,
    pub organization: String,
}

impl DiffRequest {
    pub fn new(from_ids: Vec<String>, to_ids: Vec<String>, organization: impl Into<String>) -> Self {
        Self {
            from_ids,
            to_ids,
            organization: organization.into(),
        }
    }
}
