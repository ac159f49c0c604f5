pub mod cyclonedx_cli_validator;
pub mod structural_validator;

pub use cyclonedx_cli_validator::CycloneDxCliValidator;
pub use structural_validator::StructuralValidator;
