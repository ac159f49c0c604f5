/// Use cases module containing application business logic orchestration
mod add_bom;
mod diff_boms;
mod engine_context;
mod find_bom;
mod ingest_spdx;
mod merge_boms;
mod sanitize_pipeline;

pub use add_bom::{AddBomUseCase, PreparedBom};
pub use diff_boms::DiffBomsUseCase;
pub use engine_context::EngineContext;
pub use find_bom::FindBomUseCase;
pub use ingest_spdx::IngestSpdxUseCase;
pub use merge_boms::MergeBomsUseCase;
pub use sanitize_pipeline::SanitizePipeline;
