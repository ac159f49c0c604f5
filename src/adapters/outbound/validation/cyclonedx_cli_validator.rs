use crate::bom_processing::domain::Bom;
use crate::ports::outbound::{SchemaValidator, ToolInvocation, ToolRunner};
use crate::shared::error::RebomError;
use crate::shared::{Result, ScratchFile};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// CycloneDxCliValidator adapter delegating schema validation to `cyclonedx-cli validate`
pub struct CycloneDxCliValidator {
    runner: Arc<dyn ToolRunner>,
    program: String,
    timeout: Duration,
}

impl CycloneDxCliValidator {
    pub fn new(runner: Arc<dyn ToolRunner>, program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
        }
    }

    /// "1.5" -> "v1_5"
    fn input_version(spec_version: &str) -> String {
        format!("v{}", spec_version.replace('.', "_"))
    }
}

#[async_trait]
impl SchemaValidator for CycloneDxCliValidator {
    async fn validate(&self, bom: &Bom) -> Result<Option<Vec<String>>> {
        let Some(spec_version) = bom.spec_version.as_deref() else {
            return Ok(Some(vec!["specVersion is required".to_string()]));
        };
        let input = ScratchFile::with_content(bom.to_json_string()?.as_bytes()).await?;
        let invocation = ToolInvocation::new(&self.program, self.timeout)
            .args(["validate", "--input-format", "json", "--fail-on-errors"])
            .arg("--input-version")
            .arg(Self::input_version(spec_version))
            .arg("--input-file")
            .arg(input.arg());

        match self.runner.execute(&invocation).await {
            Ok(_) => Ok(None),
            Err(e) if matches!(e.downcast_ref::<RebomError>(), Some(RebomError::Tool { .. })) => {
                Ok(Some(vec![format!(
                    "document rejected by {} for spec {}",
                    self.program, spec_version
                )]))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_version_mapping() {
        assert_eq!(CycloneDxCliValidator::input_version("1.6"), "v1_6");
        assert_eq!(CycloneDxCliValidator::input_version("1.4"), "v1_4");
    }
}
