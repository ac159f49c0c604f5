/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (an API layer,
/// the CLI) use to interact with the engine.
pub mod bom_catalog_port;

pub use bom_catalog_port::BomCatalogPort;
