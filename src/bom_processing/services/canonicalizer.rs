use crate::bom_processing::domain::{Bom, Component};
use crate::bom_processing::services::root_augmentor::compute_root_dep_index;
use crate::shared::Result;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

/// Stand-in for the root component's reference inside the digest projection.
pub const ROOT_PLACEHOLDER: &str = "__ROOT_COMPONENT__";

/// Serializes a JSON value with sorted object keys and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Keeps only the fields that define a component's identity.
fn component_identity(component: &Component) -> Value {
    let mut identity = Map::new();
    let strings = [
        ("purl", &component.purl),
        ("bom-ref", &component.bom_ref),
        ("name", &component.name),
        ("version", &component.version),
        ("group", &component.group),
        ("type", &component.component_type),
    ];
    for (key, value) in strings {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            identity.insert(key.to_string(), Value::String(v.clone()));
        }
    }
    if let Some(hashes) = &component.hashes {
        identity.insert("hashes".to_string(), hashes.clone());
    }
    if let Some(licenses) = &component.licenses {
        identity.insert("licenses".to_string(), licenses.clone());
    }
    Value::Object(identity)
}

fn component_sort_key(component: &Component) -> &str {
    component
        .bom_ref
        .as_deref()
        .or(component.purl.as_deref())
        .unwrap_or("")
}

/// Content digest over the identity projection of a BOM.
///
/// Stable under root-component renaming, timestamps and tool attribution;
/// sensitive to any change in the non-root component set or graph.
pub fn compute_bom_digest(bom: &Bom) -> Result<String> {
    // Ties on the ref key (components without bom-ref or purl) fall back to
    // the canonical identity so input order never reaches the digest.
    let mut keyed: Vec<(&str, String, Value)> = bom
        .components
        .iter()
        .map(|c| {
            let identity = component_identity(c);
            (component_sort_key(c), canonical_json(&identity), identity)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.cmp(&b.1)));
    let components: Vec<Value> = keyed.into_iter().map(|(_, _, identity)| identity).collect();

    let mut dependencies = bom.dependencies().to_vec();
    let root_ref = bom.root_bom_ref().map(str::to_string);
    if let Some(index) = compute_root_dep_index(bom) {
        dependencies[index].reference = ROOT_PLACEHOLDER.to_string();
    }
    for dependency in dependencies.iter_mut() {
        if let Some(root_ref) = &root_ref {
            for target in dependency.depends_on.iter_mut() {
                if target == root_ref {
                    *target = ROOT_PLACEHOLDER.to_string();
                }
            }
        }
        dependency.depends_on.sort();
    }
    dependencies.sort_by(|a, b| a.reference.cmp(&b.reference));

    let projection = json!({
        "components": components,
        "dependencies": serde_json::to_value(&dependencies)?,
    });
    Ok(sha256_hex(canonical_json(&projection).as_bytes()))
}
