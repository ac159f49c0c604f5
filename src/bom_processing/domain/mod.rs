pub mod bom;
pub mod bom_options;
pub mod catalog_record;
pub mod diff;
pub mod identifiers;
pub mod spdx;

pub use bom::{Bom, Component, Dependency, Metadata, Property, ToolComponents, Tools};
pub use bom_options::{BomOptions, BomStructure, RootComponentMergeMode};
pub use catalog_record::{
    BlobReceipt, BomMeta, BomModification, BomRecord, BomState, ConversionStatus,
    EnrichmentStatus, SourceFormat, SpdxRecord,
};
pub use diff::{ComponentDiff, ComponentVersion};
pub use spdx::{SpdxCreationInfo, SpdxMetadata, SpdxPackageSummary};
