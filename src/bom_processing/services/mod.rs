pub mod bom_filters;
pub mod canonicalizer;
pub mod root_augmentor;
pub mod sanitizer;
pub mod spdx_inspector;
pub mod version_reconciler;

pub use bom_filters::{extract_top_level, filter_dev_dependencies, TldExtraction};
pub use canonicalizer::{canonical_json, compute_bom_digest, sha256_hex, ROOT_PLACEHOLDER};
pub use root_augmentor::{
    attach_engine_tool, compute_root_dep_index, establish_purl, override_root_component,
};
pub use sanitizer::BomSanitizer;
pub use spdx_inspector::SpdxInspector;
pub use version_reconciler::{ReconcileDecision, VersionReconciler};
