use crate::bom_processing::domain::{Bom, BomOptions, BomStructure, Component, ToolComponents, Tools};
use crate::shared::error::{RebomError, ValidationDetails};
use crate::shared::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use packageurl::PackageUrl;
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use std::str::FromStr;

const ENGINE_NAME: &str = "rebom";
const ENGINE_GROUP: &str = "io.reliza";
const ENGINE_VENDOR: &str = "Reliza Incorporated";
const ENGINE_EMAIL: &str = "info@reliza.io";

/// Purl types that only mark a placeholder root and are replaced by `generic`.
const PLACEHOLDER_TYPES: &[&str] = &["container", "application"];
/// Purl names that only mark a placeholder root and are replaced by the override name.
const PLACEHOLDER_NAMES: &[&str] = &["app", "."];

/// Builds the purl that identifies a re-stamped root component.
///
/// An explicit `options.purl` wins. Otherwise `name`, `version` and `group`
/// are required, and type/namespace/name are carried over from the original
/// purl unless they are placeholders.
pub fn establish_purl(original: Option<&str>, options: &BomOptions) -> Result<String> {
    if let Some(purl) = options.purl.as_deref().filter(|p| !p.is_empty()) {
        return Ok(purl.to_string());
    }

    let (Some(name), Some(version), Some(group)) = (
        options.name.as_deref(),
        options.version.as_deref(),
        options.group.as_deref(),
    ) else {
        tracing::error!(
            name = ?options.name,
            version = ?options.version,
            group = ?options.group,
            "Missing required fields for purl generation"
        );
        return Err(RebomError::Validation {
            message: "name, version and group are required to generate a root purl".to_string(),
            details: Some(ValidationDetails::field("rebomOptions", "name, version, group")),
        }
        .into());
    };

    let parsed = original.and_then(|purl| match PackageUrl::from_str(purl) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!(purl, error = %e, "Ignoring unparseable root purl");
            None
        }
    });

    let purl_type = parsed
        .as_ref()
        .map(|p| p.ty())
        .filter(|t| !t.is_empty() && !PLACEHOLDER_TYPES.contains(t))
        .unwrap_or("generic")
        .to_string();

    let namespace = match &parsed {
        Some(p) if p.namespace().is_some() || purl_type == "oci" => {
            p.namespace().map(str::to_string)
        }
        _ => Some(group.to_string()),
    };

    let purl_name = parsed
        .as_ref()
        .map(|p| p.name())
        .filter(|n| !n.is_empty() && !PLACEHOLDER_NAMES.contains(n))
        .unwrap_or(name)
        .to_string();

    let mut qualifiers: Vec<(String, String)> = parsed
        .as_ref()
        .map(|p| {
            p.qualifiers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();
    if let Some(belongs_to) = options.belongs_to.as_deref().filter(|b| !b.is_empty()) {
        set_qualifier(&mut qualifiers, "belongsTo", belongs_to);
    }
    if let Some(hash) = options.hash.as_deref().filter(|h| !h.is_empty()) {
        set_qualifier(&mut qualifiers, "hash", hash);
    }
    if options.tld_only {
        set_qualifier(&mut qualifiers, "tldOnly", "true");
    }
    if options.structure == BomStructure::Hierarchical {
        set_qualifier(&mut qualifiers, "structure", "hierarchical");
    }

    let invalid = |e: packageurl::Error| RebomError::Validation {
        message: format!("cannot build root purl: {}", e),
        details: Some(ValidationDetails::field("purl", "package-url")),
    };
    let mut purl = PackageUrl::new(purl_type, purl_name).map_err(invalid)?;
    if let Some(namespace) = namespace.filter(|n| !n.is_empty()) {
        purl.with_namespace(namespace);
    }
    purl.with_version(version.to_string());
    for (key, value) in qualifiers {
        purl.add_qualifier(key, value).map_err(invalid)?;
    }
    Ok(purl.to_string())
}

fn set_qualifier(qualifiers: &mut Vec<(String, String)>, key: &str, value: &str) {
    qualifiers.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
    qualifiers.push((key.to_string(), value.to_string()));
}

/// Drops an `@version` suffix (and any qualifiers or subpath) from a reference.
fn strip_version(reference: &str) -> &str {
    let end = reference.find(['?', '#']).unwrap_or(reference.len());
    let head = &reference[..end];
    match head.rfind('@') {
        Some(index) if index > 0 => &head[..index],
        _ => head,
    }
}

fn percent_decoded(reference: &str) -> Cow<'_, str> {
    urlencoding::decode(reference).unwrap_or(Cow::Borrowed(reference))
}

/// Locates the dependency entry of the root component.
///
/// Tries an exact match on `metadata.component['bom-ref']`, then a
/// percent-decoded match, then a match with `@version` stripped.
/// Returns `None` (and logs) when the BOM has no resolvable root entry.
pub fn compute_root_dep_index(bom: &Bom) -> Option<usize> {
    let Some(root_ref) = bom.root_bom_ref() else {
        tracing::debug!("No bom-ref found in metadata.component");
        return None;
    };
    let dependencies = bom.dependencies();

    if let Some(index) = dependencies.iter().position(|d| d.reference == root_ref) {
        return Some(index);
    }

    let decoded_root = percent_decoded(root_ref);
    if let Some(index) = dependencies
        .iter()
        .position(|d| percent_decoded(&d.reference) == decoded_root)
    {
        tracing::debug!(root_ref, "Root dependency matched after percent-decoding");
        return Some(index);
    }

    let stripped_root = strip_version(root_ref);
    if let Some(index) = dependencies
        .iter()
        .position(|d| d.reference == stripped_root)
    {
        tracing::debug!(root_ref, "Root dependency matched after stripping version");
        return Some(index);
    }

    tracing::warn!(root_ref, "Root component has no entry in the dependency graph");
    None
}

/// Re-stamps the root component with the override identity and keeps the
/// dependency graph pointing at it.
pub fn override_root_component(
    mut bom: Bom,
    options: &BomOptions,
    timestamp: Option<DateTime<Utc>>,
) -> Result<Bom> {
    let original_purl = bom.root_component().and_then(|c| c.purl.clone());
    let new_purl = establish_purl(original_purl.as_deref(), options)?;
    tracing::debug!(purl = %new_purl, "Established root purl");

    let root_index = compute_root_dep_index(&bom);

    let metadata = bom.metadata_mut();
    let component = metadata.component.get_or_insert_with(Component::default);
    component.purl = Some(new_purl.clone());
    component.bom_ref = Some(new_purl.clone());
    if let Some(name) = &options.name {
        component.name = Some(name.clone());
    }
    if let Some(version) = &options.version {
        component.version = Some(version.clone());
    }
    if let Some(group) = &options.group {
        component.group = Some(group.clone());
        metadata.authors = Some(json!([{ "name": group }]));
        metadata.supplier = Some(json!({ "name": group }));
    }
    if let Some(timestamp) = timestamp {
        metadata.timestamp = Some(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    if let (Some(index), Some(dependencies)) = (root_index, bom.dependencies.as_mut()) {
        dependencies[index].reference = new_purl;
    }
    Ok(bom)
}

fn uses_tool_components(bom: &Bom) -> bool {
    bom.spec_version_pair()
        .map(|version| version >= (1, 5))
        .unwrap_or(true)
}

/// Tool descriptor for `metadata.tools.components` (spec 1.5+).
fn engine_component_descriptor(spec_version: Option<&str>) -> Value {
    let mut tool = json!({
        "type": "application",
        "name": ENGINE_NAME,
        "group": ENGINE_GROUP,
        "version": env!("CARGO_PKG_VERSION"),
        "supplier": { "name": ENGINE_VENDOR },
        "description": "Catalog of SBOMs",
        "licenses": [{ "license": { "id": "MIT" } }],
        "externalReferences": [
            { "url": "ssh://git@github.com/relizaio/rebom.git", "type": "vcs" },
            { "url": "https://reliza.io", "type": "website" }
        ]
    });
    if spec_version == Some("1.6") {
        tool["authors"] = json!([{ "name": ENGINE_VENDOR, "email": ENGINE_EMAIL }]);
    } else {
        tool["author"] = json!(ENGINE_VENDOR);
    }
    tool
}

/// Tool descriptor for the legacy `metadata.tools` array (spec 1.4 and earlier).
fn engine_legacy_descriptor() -> Value {
    json!({
        "vendor": ENGINE_VENDOR,
        "name": ENGINE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "externalReferences": [
            { "url": "ssh://git@github.com/relizaio/rebom.git", "type": "vcs" }
        ]
    })
}

fn legacy_tool_to_component(tool: Value) -> Value {
    let Value::Object(mut fields) = tool else {
        return tool;
    };
    if let Some(vendor) = fields.remove("vendor") {
        fields.entry("publisher").or_insert(vendor);
    }
    fields
        .entry("type")
        .or_insert_with(|| Value::String("application".to_string()));
    Value::Object(fields)
}

fn component_to_legacy_tool(component: Value) -> Value {
    let Value::Object(fields) = component else {
        return component;
    };
    let mut tool = Map::new();
    let vendor = fields
        .get("publisher")
        .or_else(|| fields.get("group"))
        .or_else(|| fields.get("supplier").and_then(|s| s.get("name")))
        .cloned();
    if let Some(vendor) = vendor {
        tool.insert("vendor".to_string(), vendor);
    }
    for key in ["name", "version", "hashes", "externalReferences"] {
        if let Some(value) = fields.get(key) {
            tool.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(tool)
}

/// Appends this engine to `metadata.tools`, in the shape the BOM's
/// `specVersion` calls for. A wrong-shaped existing value is re-shaped.
pub fn attach_engine_tool(bom: &mut Bom) {
    let modern = uses_tool_components(bom);
    let spec_version = bom.spec_version.clone();
    let metadata = bom.metadata_mut();

    let tools = match (metadata.tools.take(), modern) {
        (None, true) => Tools::Components(ToolComponents {
            components: vec![engine_component_descriptor(spec_version.as_deref())],
            ..ToolComponents::default()
        }),
        (None, false) => Tools::Legacy(vec![engine_legacy_descriptor()]),
        (Some(Tools::Components(mut existing)), true) => {
            existing
                .components
                .push(engine_component_descriptor(spec_version.as_deref()));
            Tools::Components(existing)
        }
        (Some(Tools::Legacy(mut existing)), false) => {
            existing.push(engine_legacy_descriptor());
            Tools::Legacy(existing)
        }
        (Some(Tools::Legacy(existing)), true) => {
            tracing::debug!("Re-shaping legacy tools array into tools.components");
            let mut components: Vec<Value> =
                existing.into_iter().map(legacy_tool_to_component).collect();
            components.push(engine_component_descriptor(spec_version.as_deref()));
            Tools::Components(ToolComponents {
                components,
                ..ToolComponents::default()
            })
        }
        (Some(Tools::Components(existing)), false) => {
            tracing::debug!("Re-shaping tools.components into a legacy tools array");
            let mut legacy: Vec<Value> = existing
                .components
                .into_iter()
                .map(component_to_legacy_tool)
                .collect();
            legacy.push(engine_legacy_descriptor());
            Tools::Legacy(legacy)
        }
    };
    metadata.tools = Some(tools);
}
