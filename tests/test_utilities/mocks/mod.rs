/// Mock implementations for testing
mod failing_content_store;
mod fake_tool_runner;

pub use failing_content_store::FailingContentStore;
pub use fake_tool_runner::FakeToolRunner;
