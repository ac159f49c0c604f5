use crate::shared::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One external command invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    /// Value following `flag` in the argument list.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// `program arg1 arg2 ...`, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// ToolRunner port for black-box command-line collaborators
///
/// Merge, diff, conversion, validation and enrichment tools all run through
/// this seam so orchestration can be exercised with an in-process fake.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs the invocation and returns its stdout
    ///
    /// # Errors
    /// A non-zero exit, any stderr output, or hitting the timeout is a failure
    async fn execute(&self, invocation: &ToolInvocation) -> Result<String>;
}
