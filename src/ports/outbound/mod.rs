/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the engine uses to reach its
/// collaborators (relational store, blob store, external tools).
pub mod catalog_repository;
pub mod content_store;
pub mod enrichment_client;
pub mod schema_validator;
pub mod tool_runner;

pub use catalog_repository::{CatalogRepository, SpdxRepository};
pub use content_store::ContentStore;
pub use enrichment_client::EnrichmentClient;
pub use schema_validator::SchemaValidator;
pub use tool_runner::{ToolInvocation, ToolRunner};
