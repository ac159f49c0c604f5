use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use rebom::bom_processing::domain::{BomOptions, BomStructure, RootComponentMergeMode};
use rebom::config::ConfigOverrides;

/// Catalog, merge and diff CycloneDX and SPDX SBOMs
#[derive(Parser, Debug)]
#[command(name = "rebom")]
#[command(version)]
#[command(about = "Catalog, merge and diff CycloneDX and SPDX SBOMs", long_about = None)]
pub struct Args {
    /// Path to a config file (defaults to ./rebom.config.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter used when RUST_LOG is not set
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Enrichment service endpoint
    #[arg(long, global = true, env = "REBOM_ENRICHMENT_URI")]
    pub enrichment_uri: Option<String>,

    /// Enrichment service API key
    #[arg(long, global = true, env = "REBOM_ENRICHMENT_API_KEY", hide_env_values = true)]
    pub enrichment_api_key: Option<String>,

    /// Artifact service base URL; blobs are kept in memory without it
    #[arg(long, global = true, env = "REBOM_ARTIFACT_SERVICE_URL")]
    pub artifact_service_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the content digest of a CycloneDX BOM
    Digest {
        file: PathBuf,
    },

    /// Repair encoding artifacts and remove duplicate entries
    Sanitize {
        file: PathBuf,
        /// Output file path (if not specified, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rewrite the root component identity
    Augment {
        file: PathBuf,
        #[command(flatten)]
        identity: IdentityArgs,
        /// Explicit root purl, replacing the synthesized one
        #[arg(long)]
        purl: Option<String>,
        #[arg(long)]
        belongs_to: Option<String>,
        #[arg(long)]
        hash: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge BOM files through the external merge tool
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        identity: IdentityArgs,
        /// FLAT or HIERARCHICAL
        #[arg(long, default_value = "FLAT")]
        structure: BomStructure,
        /// Keep only the root component's direct dependencies
        #[arg(long)]
        tld_only: bool,
        /// Drop development-scope components
        #[arg(long)]
        ignore_dev: bool,
        /// PRESERVE_UNDER_NEW_ROOT or FLATTEN_UNDER_NEW_ROOT
        #[arg(long, value_name = "MODE")]
        root_merge_mode: Option<RootComponentMergeMode>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compare the components of two BOM sets
    Diff {
        #[arg(long, num_args = 1.., required = true)]
        from: Vec<PathBuf>,
        #[arg(long, num_args = 1.., required = true)]
        to: Vec<PathBuf>,
    },

    /// Ingest CycloneDX or SPDX files, in order, into an in-memory catalog
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Owning organization
        #[arg(long, default_value = "default")]
        org: String,
    },
}

/// Root component identity
#[derive(ClapArgs, Debug, Clone)]
pub struct IdentityArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub group: String,
    #[arg(long = "version", id = "component_version")]
    pub version: String,
}

impl IdentityArgs {
    pub fn to_options(&self) -> BomOptions {
        BomOptions::with_identity(&self.name, &self.group, &self.version)
    }
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            enrichment_uri: self.enrichment_uri.clone(),
            enrichment_api_key: self.enrichment_api_key.clone(),
            artifact_service_url: self.artifact_service_url.clone(),
            log_level: self.log_level.clone(),
        }
    }
}
