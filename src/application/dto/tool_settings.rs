use std::time::Duration;

/// Program names of the external collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPrograms {
    pub merge: String,
    pub diff: String,
    pub convert: String,
    pub validate: String,
    pub enrich: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            merge: "rearm-cli".to_string(),
            diff: "cyclonedx-cli".to_string(),
            convert: "rearm-cli".to_string(),
            validate: "cyclonedx-cli".to_string(),
            enrich: "rearm-cli".to_string(),
        }
    }
}

/// Per-tool time limits. Conversion and enrichment get the long ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolTimeouts {
    pub validation: Duration,
    pub merge: Duration,
    pub diff: Duration,
    pub conversion: Duration,
    pub enrichment: Duration,
}

impl Default for ToolTimeouts {
    fn default() -> Self {
        Self {
            validation: Duration::from_secs(30),
            merge: Duration::from_secs(120),
            diff: Duration::from_secs(60),
            conversion: Duration::from_secs(120),
            enrichment: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSettings {
    pub programs: ToolPrograms,
    pub timeouts: ToolTimeouts,
}
