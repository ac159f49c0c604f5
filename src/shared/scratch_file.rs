use crate::shared::Result;
use std::path::Path;
use tempfile::NamedTempFile;

/// A uniquely named temporary file used to hand content to an external tool.
///
/// The file is removed when the value is dropped, on every exit path,
/// including a cancelled future or a tool timeout.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Creates an empty scratch file, typically a tool's `--outfile`.
    pub fn empty() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("rebom-")
            .suffix(".json")
            .tempfile()?;
        Ok(Self { file })
    }

    pub async fn with_content(content: &[u8]) -> Result<Self> {
        let scratch = Self::empty()?;
        tokio::fs::write(scratch.path(), content).await?;
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Path as a command-line argument.
    pub fn arg(&self) -> String {
        self.file.path().to_string_lossy().into_owned()
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.path()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scratch_file_round_trip_and_cleanup() {
        let scratch = ScratchFile::with_content(b"{\"a\":1}").await.unwrap();
        let path = scratch.path().to_path_buf();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("rebom-"));
        assert_eq!(scratch.read().await.unwrap(), b"{\"a\":1}");

        drop(scratch);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_scratch_file_removed_on_error_path() {
        async fn failing_step(scratch: &ScratchFile) -> Result<()> {
            let _ = scratch.path();
            anyhow::bail!("tool failed")
        }

        let scratch = ScratchFile::empty().unwrap();
        let path = scratch.path().to_path_buf();
        let result = async move {
            let held = scratch;
            failing_step(&held).await
        }
        .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
