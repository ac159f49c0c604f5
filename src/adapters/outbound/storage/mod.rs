pub mod artifact_service_store;
pub mod in_memory_catalog;
pub mod in_memory_content_store;

pub use artifact_service_store::{ArtifactServiceSettings, ArtifactServiceStore};
pub use in_memory_catalog::InMemoryCatalog;
pub use in_memory_content_store::InMemoryContentStore;
