pub mod cli_enrichment_client;

pub use cli_enrichment_client::{CliEnrichmentClient, EnrichmentEndpoint};
