use crate::ports::outbound::{ToolInvocation, ToolRunner};
use crate::shared::error::RebomError;
use crate::shared::Result;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::Semaphore;

const DEFAULT_MAX_CONCURRENT: usize = 4;

/// SubprocessToolRunner adapter running tools as isolated child processes
///
/// stdout is the only success channel. stderr is logged and never returned
/// to callers. Children are killed when the future is dropped, so a timeout
/// or a cancelled caller never leaves a process behind. Clones share one
/// permit pool, so at most `max_concurrent` children run at a time.
#[derive(Debug, Clone)]
pub struct SubprocessToolRunner {
    permits: Arc<Semaphore>,
}

impl SubprocessToolRunner {
    pub fn new() -> Self {
        Self::with_concurrency(DEFAULT_MAX_CONCURRENT)
    }

    /// Runner allowing `max_concurrent` children at once (at least one).
    pub fn with_concurrency(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Permits not currently held by a running tool.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

impl Default for SubprocessToolRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolRunner for SubprocessToolRunner {
    async fn execute(&self, invocation: &ToolInvocation) -> Result<String> {
        let program = invocation.program.as_str();
        let _permit = self.permits.acquire().await.map_err(|_| {
            RebomError::tool(program, "tool runner is shut down")
        })?;
        tracing::debug!(tool = program, command = %invocation.command_line(), "Running external tool");

        let mut child = Command::new(program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!(tool = program, error = %e, "Failed to spawn external tool");
                RebomError::tool(program, "failed to start")
            })?;

        let writer = match (invocation.stdin.clone(), child.stdin.take()) {
            (Some(input), Some(mut stdin)) => Some(tokio::spawn(async move {
                stdin.write_all(&input).await?;
                stdin.shutdown().await
            })),
            _ => None,
        };

        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(output) => output.map_err(|e| {
                tracing::error!(tool = program, error = %e, "Failed to collect tool output");
                RebomError::tool(program, "failed to collect output")
            })?,
            Err(_) => {
                tracing::error!(
                    tool = program,
                    timeout_secs = invocation.timeout.as_secs_f64(),
                    "External tool timed out"
                );
                return Err(RebomError::tool(
                    program,
                    format!("timed out after {:?}", invocation.timeout),
                )
                .into());
            }
        };

        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.await {
                tracing::warn!(tool = program, error = %e, "Writing tool stdin failed");
            }
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            tracing::error!(
                tool = program,
                status = ?output.status.code(),
                stderr = %stderr.trim(),
                "External tool exited with failure"
            );
            let message = match output.status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            };
            return Err(RebomError::tool(program, message).into());
        }
        if !stderr.trim().is_empty() {
            tracing::error!(tool = program, stderr = %stderr.trim(), "External tool wrote to stderr");
            return Err(RebomError::tool(program, "reported errors on stderr").into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> ToolInvocation {
        ToolInvocation::new("sh", Duration::from_secs(5)).args(["-c", script])
    }

    #[tokio::test]
    async fn test_stdout_is_returned() {
        let out = SubprocessToolRunner::new()
            .execute(&sh("printf '{\"ok\":true}'"))
            .await
            .unwrap();
        assert_eq!(out, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_stdin_is_piped() {
        let invocation = ToolInvocation::new("cat", Duration::from_secs(5)).stdin(b"hello".to_vec());
        let out = SubprocessToolRunner::new().execute(&invocation).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let err = SubprocessToolRunner::new()
            .execute(&sh("exit 3"))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("status 3"), "{}", message);
    }

    #[tokio::test]
    async fn test_stderr_output_is_failure_and_not_echoed() {
        let err = SubprocessToolRunner::new()
            .execute(&sh("echo 'secret stack trace' >&2; echo ok"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RebomError>(),
            Some(RebomError::Tool { .. })
        ));
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let invocation = ToolInvocation::new("sleep", Duration::from_millis(100)).arg("5");
        let started = std::time::Instant::now();
        let err = SubprocessToolRunner::new()
            .execute(&invocation)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_running_tools_are_capped() {
        let runner = SubprocessToolRunner::with_concurrency(2);
        let slow = ToolInvocation::new("sleep", Duration::from_secs(5)).arg("0.3");

        let max_running = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let runner = runner.clone();
                let slow = slow.clone();
                tokio::spawn(async move { runner.execute(&slow).await })
            })
            .collect();

        let watcher = {
            let runner = runner.clone();
            let max_running = Arc::clone(&max_running);
            tokio::spawn(async move {
                for _ in 0..40 {
                    let running = 2 - runner.available_permits();
                    max_running.fetch_max(running, std::sync::atomic::Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
        };

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        watcher.await.unwrap();
        assert_eq!(max_running.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(runner.available_permits(), 2);
    }

    #[test]
    fn test_zero_concurrency_still_allows_one_tool() {
        assert_eq!(SubprocessToolRunner::with_concurrency(0).available_permits(), 1);
    }

    #[tokio::test]
    async fn test_missing_program_is_failure() {
        let invocation = ToolInvocation::new("rebom-no-such-tool", Duration::from_secs(1));
        assert!(SubprocessToolRunner::new().execute(&invocation).await.is_err());
    }
}
