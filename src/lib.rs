//! rebom - catalog and versioned storage engine for SBOMs
//!
//! This library ingests CycloneDX and SPDX documents, repairs and
//! deduplicates them, keeps a versioned catalog keyed by serial number, and
//! merges or diffs stored BOMs through external command-line tools.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`bom_processing`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use cases, scheduler and wiring
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use rebom::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = EngineFactory::build(&EngineConfig::default())?;
//! let document = std::fs::read("bom.json")?;
//!
//! let record = engine
//!     .service
//!     .add_bom(AddBomRequest::new(document, BomOptions::default(), "my-org"))
//!     .await?;
//! println!("{} v{}", record.serial_number, record.bom_version);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod bom_processing;
pub mod config;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::storage::{InMemoryCatalog, InMemoryContentStore};
    pub use crate::application::dto::{
        AddBomRequest, DiffRequest, MergeOutcome, MergeRequest, RawFormat, SpdxIngestRequest,
    };
    pub use crate::application::factories::{Engine, EngineFactory};
    pub use crate::application::scheduler::{EnrichmentScheduler, SchedulerSettings};
    pub use crate::application::CatalogService;
    pub use crate::bom_processing::domain::{
        Bom, BomMeta, BomOptions, BomRecord, BomStructure, ComponentDiff, ComponentVersion,
        RootComponentMergeMode,
    };
    pub use crate::config::EngineConfig;
    pub use crate::ports::inbound::BomCatalogPort;
    pub use crate::ports::outbound::{
        CatalogRepository, ContentStore, EnrichmentClient, SchemaValidator, SpdxRepository,
        ToolInvocation, ToolRunner,
    };
    pub use crate::shared::error::{ApiError, ErrorCode, RebomError};
    pub use crate::shared::Result;
}
