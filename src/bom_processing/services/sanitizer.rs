use crate::bom_processing::domain::{Bom, Dependency};
use std::collections::HashSet;

/// Ordered textual repairs applied to raw BOM JSON before parsing.
///
/// The first six entries target unicode escapes emitted by some generators;
/// the rest fix a field-name typo and git URL schemes.
const TEXT_REPAIRS: &[(&str, &str)] = &[
    (r"\u003c", "<"),
    (r"\u003e", ">"),
    (r"\u0022", ""),
    (r"\u002B", "+"),
    (r"\u0027", ","),
    (r"\u0060", ""),
    ("Purl", "purl"),
    (":git@github", ":ssh://git@github"),
    ("git+https://github", "ssh://git@github"),
];

pub struct BomSanitizer;

impl BomSanitizer {
    /// Applies the repair table to serialized BOM text.
    pub fn sanitize_text(text: &str) -> String {
        let mut out = text.to_string();
        for (search, replace) in TEXT_REPAIRS {
            if !out.contains(search) {
                continue;
            }
            out = if search.starts_with('\\') {
                replace_unescaped(&out, search, replace)
            } else {
                out.replace(search, replace)
            };
        }
        out
    }

    /// Removes duplicate components and dependency entries and drops
    /// top-level fields outside the allow-list.
    pub fn deduplicate(mut bom: Bom) -> Bom {
        let before = bom.components.len();
        let mut seen_purls = HashSet::new();
        let mut seen_name_versions = HashSet::new();
        bom.components.retain(|component| {
            if let Some(purl) = component.purl.as_deref().filter(|p| !p.is_empty()) {
                let fresh = seen_purls.insert(purl.to_string());
                if !fresh {
                    tracing::debug!(purl, "Deduplicated component by purl");
                }
                return fresh;
            }
            if let (Some(name), Some(version)) = (&component.name, &component.version) {
                let key = format!("{}_{}", name, version);
                let fresh = seen_name_versions.insert(key);
                if !fresh {
                    tracing::debug!(name = %name, version = %version, "Deduplicated component by name");
                }
                return fresh;
            }
            true
        });

        if let Some(dependencies) = bom.dependencies.take() {
            bom.dependencies = Some(Self::deduplicate_dependencies(dependencies));
        }

        if !bom.extra.is_empty() {
            tracing::debug!(
                dropped = ?bom.extra.keys().collect::<Vec<_>>(),
                "Dropping top-level fields outside the allow-list"
            );
            bom.extra.clear();
        }

        tracing::debug!(
            serial_number = bom.serial_number.as_deref().unwrap_or(""),
            before,
            after = bom.components.len(),
            "Deduplicated BOM components"
        );
        bom
    }

    fn deduplicate_dependencies(dependencies: Vec<Dependency>) -> Vec<Dependency> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(dependencies.len());
        for mut dependency in dependencies {
            let mut targets = HashSet::new();
            dependency
                .depends_on
                .retain(|target| targets.insert(target.clone()));

            let mut sorted = dependency.depends_on.clone();
            sorted.sort();
            if seen.insert((dependency.reference.clone(), sorted)) {
                out.push(dependency);
            }
        }
        out
    }
}

/// Replaces `pattern` (which starts with a backslash) only where that
/// backslash is not itself escaped.
fn replace_unescaped(text: &str, pattern: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(pattern) {
        out.push_str(&rest[..pos]);
        let preceding = out.chars().rev().take_while(|c| *c == '\\').count();
        if preceding % 2 == 0 {
            out.push_str(replacement);
        } else {
            out.push_str(pattern);
        }
        rest = &rest[pos + pattern.len()..];
    }
    out.push_str(rest);
    out
}
