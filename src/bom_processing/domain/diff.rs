use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentVersion {
    pub purl: String,
    #[serde(default)]
    pub version: String,
}

impl ComponentVersion {
    pub fn new(purl: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            purl: purl.into(),
            version: version.into(),
        }
    }
}

/// Result of comparing two BOM sets. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDiff {
    pub added: Vec<ComponentVersion>,
    pub removed: Vec<ComponentVersion>,
}

impl ComponentDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}
