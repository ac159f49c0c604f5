/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod enrichment;
pub mod process;
pub mod storage;
pub mod validation;
