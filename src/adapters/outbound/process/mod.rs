pub mod subprocess_runner;

pub use subprocess_runner::SubprocessToolRunner;
