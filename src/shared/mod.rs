pub mod error;
pub mod result;
pub mod scratch_file;

pub use result::Result;
pub use scratch_file::ScratchFile;
