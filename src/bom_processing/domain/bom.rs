use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields the engine does not interpret, kept verbatim on round-trip.
pub type ExtraFields = BTreeMap<String, Value>;

/// Partial CycloneDX document model.
///
/// Only the structures the engine reasons about are typed; everything else
/// rides along in `extra` bags or as opaque `Value`s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bom {
    #[serde(rename = "bomFormat", default, skip_serializing_if = "Option::is_none")]
    pub bom_format: Option<String>,
    #[serde(rename = "specVersion", default, skip_serializing_if = "Option::is_none")]
    pub spec_version: Option<String>,
    #[serde(rename = "serialNumber", default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formulation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declarations: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vulnerabilities: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compositions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Value>,
    #[serde(
        rename = "externalReferences",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub external_references: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
    /// Top-level fields outside the allow-list; dropped by deduplication.
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Tools>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<Value>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// `metadata.tools` changed shape in CycloneDX 1.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tools {
    /// Spec 1.4 and earlier: a plain array of tool descriptors.
    Legacy(Vec<Value>),
    /// Spec 1.5 and later: `{ "components": [...], "services": [...] }`.
    Components(ToolComponents),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolComponents {
    #[serde(default)]
    pub components: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "bom-ref", default, skip_serializing_if = "Option::is_none")]
    pub bom_ref: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub licenses: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<Property>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Component {
    /// Looks up the value of a `properties[]` entry by name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .as_ref()?
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One node of the dependency graph.
///
/// `dependsOn` is always an array once deserialized: null, empty strings and
/// bare scalars produced by external tools are coerced on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "ref", default)]
    pub reference: String,
    #[serde(
        rename = "dependsOn",
        default,
        deserialize_with = "coerce_depends_on"
    )]
    pub depends_on: Vec<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Dependency {
    pub fn new(reference: impl Into<String>, depends_on: Vec<String>) -> Self {
        Self {
            reference: reference.into(),
            depends_on,
            extra: ExtraFields::new(),
        }
    }
}

fn coerce_depends_on<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(normalize_depends_on(value.unwrap_or(Value::Null)))
}

/// Coerces any JSON shape into a list of dependency references.
pub fn normalize_depends_on(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::String(s) => vec![s],
        Value::Number(n) => vec![n.to_string()],
        Value::Bool(b) => vec![b.to_string()],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::Object(_) => {
            tracing::debug!("Dropping object-shaped dependsOn value");
            Vec::new()
        }
    }
}

impl Bom {
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn root_component(&self) -> Option<&Component> {
        self.metadata.as_ref()?.component.as_ref()
    }

    /// `metadata.component['bom-ref']`, the anchor of the dependency graph.
    pub fn root_bom_ref(&self) -> Option<&str> {
        self.root_component()?
            .bom_ref
            .as_deref()
            .filter(|r| !r.is_empty())
    }

    pub fn dependencies(&self) -> &[Dependency] {
        self.dependencies.as_deref().unwrap_or(&[])
    }

    /// Parses `specVersion` ("1.5") into a `(major, minor)` pair.
    pub fn spec_version_pair(&self) -> Option<(u32, u32)> {
        let spec = self.spec_version.as_deref()?;
        let mut parts = spec.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().unwrap_or("0").parse().ok()?;
        Some((major, minor))
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata.get_or_insert_with(Metadata::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_depends_on_null_becomes_empty_array() {
        let bom = Bom::from_value(json!({
            "dependencies": [{ "ref": "a", "dependsOn": null }]
        }))
        .unwrap();
        assert!(bom.dependencies()[0].depends_on.is_empty());
    }

    #[test]
    fn test_depends_on_missing_becomes_empty_array() {
        let bom = Bom::from_value(json!({ "dependencies": [{ "ref": "a" }] })).unwrap();
        assert!(bom.dependencies()[0].depends_on.is_empty());
        let out = bom.to_value().unwrap();
        assert_eq!(out["dependencies"][0]["dependsOn"], json!([]));
    }

    #[test]
    fn test_depends_on_empty_string_becomes_empty_array() {
        let bom = Bom::from_value(json!({
            "dependencies": [{ "ref": "a", "dependsOn": "" }]
        }))
        .unwrap();
        assert!(bom.dependencies()[0].depends_on.is_empty());
    }

    #[test]
    fn test_depends_on_scalar_becomes_single_element_array() {
        let bom = Bom::from_value(json!({
            "dependencies": [{ "ref": "a", "dependsOn": "pkg:npm/b@1" }]
        }))
        .unwrap();
        assert_eq!(bom.dependencies()[0].depends_on, vec!["pkg:npm/b@1"]);
    }

    #[test]
    fn test_depends_on_object_is_dropped() {
        let bom = Bom::from_value(json!({
            "dependencies": [{ "ref": "a", "dependsOn": { "ref": "b" } }]
        }))
        .unwrap();
        assert!(bom.dependencies()[0].depends_on.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let input = json!({
            "bomFormat": "CycloneDX",
            "$schema": "http://cyclonedx.org/schema/bom-1.5.schema.json",
            "components": [{ "name": "a", "evidence": { "occurrences": [] } }]
        });
        let bom = Bom::from_value(input).unwrap();
        assert!(bom.extra.contains_key("$schema"));
        assert!(bom.components[0].extra.contains_key("evidence"));
        let out = bom.to_value().unwrap();
        assert_eq!(
            out["$schema"],
            "http://cyclonedx.org/schema/bom-1.5.schema.json"
        );
    }

    #[test]
    fn test_tools_both_shapes_parse() {
        let legacy = Bom::from_value(json!({
            "metadata": { "tools": [{ "vendor": "x", "name": "y" }] }
        }))
        .unwrap();
        assert!(matches!(
            legacy.metadata.unwrap().tools,
            Some(Tools::Legacy(ref t)) if t.len() == 1
        ));

        let modern = Bom::from_value(json!({
            "metadata": { "tools": { "components": [{ "type": "application", "name": "y" }] } }
        }))
        .unwrap();
        assert!(matches!(
            modern.metadata.unwrap().tools,
            Some(Tools::Components(ref t)) if t.components.len() == 1
        ));
    }

    #[test]
    fn test_root_bom_ref_and_spec_version() {
        let bom = Bom::from_value(json!({
            "specVersion": "1.6",
            "metadata": { "component": { "bom-ref": "pkg:generic/app@1", "name": "app" } }
        }))
        .unwrap();
        assert_eq!(bom.root_bom_ref(), Some("pkg:generic/app@1"));
        assert_eq!(bom.spec_version_pair(), Some((1, 6)));
    }

    #[test]
    fn test_component_property_lookup() {
        let component: Component = serde_json::from_value(json!({
            "name": "jest",
            "properties": [{ "name": "cdx:npm:package:development", "value": "true" }]
        }))
        .unwrap();
        assert_eq!(component.property("cdx:npm:package:development"), Some("true"));
        assert_eq!(component.property("missing"), None);
    }
}
