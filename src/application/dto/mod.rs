/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the domain layer isolated.
mod ingest_request;
mod merge_request;
mod tool_settings;

pub use ingest_request::{AddBomRequest, DocumentInput, RawFormat, SpdxIngestRequest};
pub use merge_request::{DiffRequest, MergeOutcome, MergeRequest};
pub use tool_settings::{ToolPrograms, ToolSettings, ToolTimeouts};
