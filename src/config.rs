//! Configuration file support for rebom.
//!
//! Provides YAML-based configuration through `rebom.config.yml` files,
//! including data structures, file loading, and validation.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::application::dto::{ToolPrograms, ToolSettings, ToolTimeouts};
use crate::shared::Result;

pub const CONFIG_FILENAME: &str = "rebom.config.yml";

/// Top-level configuration file schema.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tools: ToolsConfig,
    pub timeouts: TimeoutsConfig,
    pub enrichment: EnrichmentConfig,
    pub content_store: ContentStoreConfig,
    pub log_level: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Program names of the external tools.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub merge: String,
    pub diff: String,
    pub convert: String,
    pub validate: String,
    pub enrich: String,
    /// Validate with `cyclonedx-cli validate` instead of the built-in structural checks
    pub external_validation: bool,
    /// Upper bound on tool subprocesses running at once
    pub max_concurrent: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let programs = ToolPrograms::default();
        Self {
            merge: programs.merge,
            diff: programs.diff,
            convert: programs.convert,
            validate: programs.validate,
            enrich: programs.enrich,
            external_validation: false,
            max_concurrent: 4,
        }
    }
}

/// Tool time limits in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub validation: u64,
    pub merge: u64,
    pub diff: u64,
    pub conversion: u64,
    pub enrichment: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        let timeouts = ToolTimeouts::default();
        Self {
            validation: timeouts.validation.as_secs(),
            merge: timeouts.merge.as_secs(),
            diff: timeouts.diff.as_secs(),
            conversion: timeouts.conversion.as_secs(),
            enrichment: timeouts.enrichment.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub interval_secs: u64,
    pub batch_size: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            interval_secs: 300,
            batch_size: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContentStoreConfig {
    /// Without a URL blobs are kept in memory.
    pub artifact_service_url: Option<String>,
    pub registry: String,
    pub repository: String,
    pub max_retries: u32,
}

impl Default for ContentStoreConfig {
    fn default() -> Self {
        Self {
            artifact_service_url: None,
            registry: "rebom".to_string(),
            repository: "boms".to_string(),
            max_retries: 3,
        }
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub enrichment_uri: Option<String>,
    pub enrichment_api_key: Option<String>,
    pub artifact_service_url: Option<String>,
    pub log_level: Option<String>,
}

impl EngineConfig {
    /// Applies command-line overrides and validates the merged result.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if overrides.enrichment_uri.is_some() {
            self.enrichment.endpoint = overrides.enrichment_uri;
        }
        if overrides.enrichment_api_key.is_some() {
            self.enrichment.api_key = overrides.enrichment_api_key;
        }
        if overrides.artifact_service_url.is_some() {
            self.content_store.artifact_service_url = overrides.artifact_service_url;
        }
        if overrides.log_level.is_some() {
            self.log_level = overrides.log_level;
        }
        validate_config(&self)?;
        Ok(self)
    }

    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            programs: ToolPrograms {
                merge: self.tools.merge.clone(),
                diff: self.tools.diff.clone(),
                convert: self.tools.convert.clone(),
                validate: self.tools.validate.clone(),
                enrich: self.tools.enrich.clone(),
            },
            timeouts: ToolTimeouts {
                validation: Duration::from_secs(self.timeouts.validation),
                merge: Duration::from_secs(self.timeouts.merge),
                diff: Duration::from_secs(self.timeouts.diff),
                conversion: Duration::from_secs(self.timeouts.conversion),
                enrichment: Duration::from_secs(self.timeouts.enrichment),
            },
        }
    }
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: EngineConfig = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    validate_config(&config)?;
    warn_unknown_fields(&config);

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<EngineConfig>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Validate the loaded configuration.
pub fn validate_config(config: &EngineConfig) -> Result<()> {
    let timeouts = [
        ("validation", config.timeouts.validation),
        ("merge", config.timeouts.merge),
        ("diff", config.timeouts.diff),
        ("conversion", config.timeouts.conversion),
        ("enrichment", config.timeouts.enrichment),
    ];
    for (name, secs) in timeouts {
        if secs == 0 {
            bail!(
                "Invalid config: timeouts.{} must be greater than 0.\n\n\
                 💡 Hint: Timeouts are given in seconds.",
                name
            );
        }
    }

    if config.tools.max_concurrent == 0 {
        bail!("Invalid config: tools.max_concurrent must be greater than 0.");
    }

    if config.enrichment.batch_size == 0 {
        bail!("Invalid config: enrichment.batch_size must be greater than 0.");
    }
    if config.enrichment.interval_secs == 0 {
        bail!("Invalid config: enrichment.interval_secs must be greater than 0.");
    }

    let has_endpoint = config
        .enrichment
        .endpoint
        .as_deref()
        .is_some_and(|e| !e.trim().is_empty());
    let has_key = config
        .enrichment
        .api_key
        .as_deref()
        .is_some_and(|k| !k.trim().is_empty());
    if has_endpoint && !has_key {
        bail!(
            "Invalid config: enrichment.endpoint is set but enrichment.api_key is missing.\n\n\
             💡 Hint: Provide the key in the config file or through REBOM_ENRICHMENT_API_KEY."
        );
    }
    Ok(())
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &EngineConfig) {
    for key in config.unknown_fields.keys() {
        eprintln!(
            "⚠️  Warning: Unknown config field '{}' will be ignored.",
            key
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_valid_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
tools:
  merge: /opt/rearm/rearm-cli
  external_validation: true
timeouts:
  merge: 240
enrichment:
  endpoint: https://bear.example
  api_key: secret
  batch_size: 25
content_store:
  artifact_service_url: http://oci-artifact:8083
log_level: debug
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.tools.merge, "/opt/rearm/rearm-cli");
        assert_eq!(config.tools.diff, "cyclonedx-cli");
        assert!(config.tools.external_validation);
        assert_eq!(config.timeouts.merge, 240);
        assert_eq!(config.timeouts.validation, 30);
        assert_eq!(config.enrichment.batch_size, 25);
        assert_eq!(config.enrichment.interval_secs, 300);
        assert_eq!(
            config.content_store.artifact_service_url.as_deref(),
            Some("http://oci-artifact:8083")
        );
        assert_eq!(config.content_store.registry, "rebom");
        assert_eq!(config.log_level.as_deref(), Some("debug"));

        let settings = config.tool_settings();
        assert_eq!(settings.timeouts.merge, Duration::from_secs(240));
    }

    #[test]
    fn test_discover_config_found() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(CONFIG_FILENAME);
        fs::write(&config_path, "log_level: warn\n").unwrap();

        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_some());
        assert_eq!(config.unwrap().log_level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_discover_config_not_found() {
        let dir = TempDir::new().unwrap();
        let config = discover_config(dir.path()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config_from_path(Path::new("/nonexistent/config.yml"));
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_parse_error() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("bad.yml");
        fs::write(&config_path, "invalid: yaml: [[[broken").unwrap();

        let result = load_config_from_path(&config_path);
        assert!(result.is_err());
        let err = format!("{}", result.unwrap_err());
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "timeouts:\n  diff: 0\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("timeouts.diff"));
    }

    #[test]
    fn test_zero_tool_concurrency_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "tools:\n  max_concurrent: 0\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("tools.max_concurrent"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(&config_path, "enrichment:\n  batch_size: 0\n").unwrap();

        let err = format!("{}", load_config_from_path(&config_path).unwrap_err());
        assert!(err.contains("batch_size"));
    }

    #[test]
    fn test_endpoint_without_api_key_rejected() {
        let err = EngineConfig::default()
            .with_overrides(ConfigOverrides {
                enrichment_uri: Some("https://bear.example".to_string()),
                ..ConfigOverrides::default()
            })
            .unwrap_err();
        assert!(format!("{}", err).contains("api_key"));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let config = EngineConfig::default()
            .with_overrides(ConfigOverrides {
                enrichment_uri: Some("https://bear.example".to_string()),
                enrichment_api_key: Some("key".to_string()),
                artifact_service_url: Some("http://localhost:8083".to_string()),
                log_level: None,
            })
            .unwrap();
        assert_eq!(
            config.enrichment.endpoint.as_deref(),
            Some("https://bear.example")
        );
        assert_eq!(
            config.content_store.artifact_service_url.as_deref(),
            Some("http://localhost:8083")
        );
    }

    #[test]
    fn test_unknown_fields_warning() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yml");
        fs::write(
            &config_path,
            r#"
log_level: info
unknown_field: true
another_unknown: value
"#,
        )
        .unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert_eq!(config.unknown_fields.len(), 2);
        assert!(config.unknown_fields.contains_key("unknown_field"));
        assert!(config.unknown_fields.contains_key("another_unknown"));
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.enrichment.endpoint.is_none());
        assert!(config.content_store.artifact_service_url.is_none());
        assert!(!config.tools.external_validation);
        assert_eq!(config.tools.max_concurrent, 4);
        assert!(config.unknown_fields.is_empty());
        assert!(validate_config(&config).is_ok());
    }
}
