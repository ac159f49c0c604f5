use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the external merge tool lays out the merged component tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BomStructure {
    #[default]
    Flat,
    Hierarchical,
}

impl BomStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            BomStructure::Flat => "FLAT",
            BomStructure::Hierarchical => "HIERARCHICAL",
        }
    }
}

impl fmt::Display for BomStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BomStructure {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FLAT" => Ok(BomStructure::Flat),
            "HIERARCHICAL" => Ok(BomStructure::Hierarchical),
            other => Err(format!(
                "invalid structure '{}', expected FLAT or HIERARCHICAL",
                other
            )),
        }
    }
}

/// Controls how each input's root component is placed under the new merged root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RootComponentMergeMode {
    PreserveUnderNewRoot,
    FlattenUnderNewRoot,
}

impl RootComponentMergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootComponentMergeMode::PreserveUnderNewRoot => "PRESERVE_UNDER_NEW_ROOT",
            RootComponentMergeMode::FlattenUnderNewRoot => "FLATTEN_UNDER_NEW_ROOT",
        }
    }
}

impl fmt::Display for RootComponentMergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RootComponentMergeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "PRESERVE_UNDER_NEW_ROOT" => Ok(RootComponentMergeMode::PreserveUnderNewRoot),
            "FLATTEN_UNDER_NEW_ROOT" => Ok(RootComponentMergeMode::FlattenUnderNewRoot),
            other => Err(format!("invalid root component merge mode '{}'", other)),
        }
    }
}

/// Caller-supplied options for ingestion and merge.
///
/// `name`/`group`/`version` are the root-component override; when all three
/// (or an explicit `purl`) are present the root component is re-stamped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BomOptions {
    pub serial_number: Option<String>,
    pub name: Option<String>,
    pub group: Option<String>,
    pub version: Option<String>,
    pub purl: Option<String>,
    pub belongs_to: Option<String>,
    pub hash: Option<String>,
    pub notes: Option<String>,
    pub tld_only: bool,
    pub ignore_dev: bool,
    pub structure: BomStructure,
    pub root_component_merge_mode: Option<RootComponentMergeMode>,
}

impl BomOptions {
    pub fn with_identity(
        name: impl Into<String>,
        group: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            group: Some(group.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    /// True when the options carry enough to override the root component.
    pub fn has_root_override(&self) -> bool {
        self.purl.is_some()
            || (self.name.is_some() && self.group.is_some() && self.version.is_some())
    }
}
