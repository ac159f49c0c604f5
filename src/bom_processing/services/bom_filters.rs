use crate::bom_processing::domain::Bom;
use crate::bom_processing::policies::DevDependencyPolicy;
use crate::bom_processing::services::root_augmentor::compute_root_dep_index;
use std::collections::HashSet;

/// Outcome of top-level-dependency extraction.
#[derive(Debug, Clone)]
pub struct TldExtraction {
    pub bom: Bom,
    /// The root reference could not be resolved and the full BOM was kept.
    pub degraded: bool,
}

/// Keeps only the components the root component directly depends on.
///
/// A BOM without a resolvable root entry passes through unchanged and is
/// reported as degraded rather than failing the caller.
pub fn extract_top_level(mut bom: Bom) -> TldExtraction {
    let before = bom.components.len();
    let Some(index) = compute_root_dep_index(&bom) else {
        tracing::warn!("Cannot resolve root dependency, keeping full BOM for TLD extraction");
        return TldExtraction {
            bom,
            degraded: true,
        };
    };

    let root_dependency = bom.dependencies()[index].clone();
    if root_dependency.depends_on.is_empty() || bom.components.is_empty() {
        tracing::warn!(
            root_ref = %root_dependency.reference,
            "Root component has no direct dependencies, keeping full BOM"
        );
        return TldExtraction {
            bom,
            degraded: true,
        };
    }

    let direct: HashSet<&str> = root_dependency
        .depends_on
        .iter()
        .map(String::as_str)
        .collect();
    bom.components.retain(|component| {
        component
            .bom_ref
            .as_deref()
            .is_some_and(|r| direct.contains(r))
    });
    bom.dependencies = Some(vec![root_dependency]);

    tracing::info!(before, after = bom.components.len(), "Extracted top-level dependencies");
    TldExtraction {
        bom,
        degraded: false,
    }
}

/// Drops development-scope components and prunes graph edges to them.
///
/// Dependency entries survive only when their `ref` is a remaining
/// component or the root.
pub fn filter_dev_dependencies(mut bom: Bom) -> Bom {
    let before = bom.components.len();
    bom.components
        .retain(|component| !DevDependencyPolicy::is_dev_dependency(component));

    let remaining: HashSet<String> = bom
        .components
        .iter()
        .filter_map(|c| c.bom_ref.clone())
        .collect();
    let root_ref = bom.root_bom_ref().map(str::to_string);

    if let Some(dependencies) = bom.dependencies.as_mut() {
        for dependency in dependencies.iter_mut() {
            dependency
                .depends_on
                .retain(|target| remaining.contains(target));
        }
        dependencies.retain(|dependency| {
            remaining.contains(&dependency.reference)
                || root_ref.as_deref() == Some(dependency.reference.as_str())
        });
    }

    tracing::info!(before, after = bom.components.len(), "Filtered dev dependencies");
    bom
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Bom {
        Bom::from_value(json!({
            "metadata": { "component": { "bom-ref": "root", "name": "app" } },
            "components": [
                { "bom-ref": "a", "name": "a" },
                { "bom-ref": "b", "name": "b" },
                { "bom-ref": "c", "name": "c",
                  "properties": [{ "name": "cdx:npm:package:development", "value": "true" }] }
            ],
            "dependencies": [
                { "ref": "root", "dependsOn": ["a", "c"] },
                { "ref": "a", "dependsOn": ["b"] },
                { "ref": "c", "dependsOn": ["b"] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_extract_top_level_keeps_direct_dependencies() {
        let extraction = extract_top_level(sample());
        assert!(!extraction.degraded);
        let refs: Vec<_> = extraction
            .bom
            .components
            .iter()
            .map(|c| c.bom_ref.clone().unwrap())
            .collect();
        assert_eq!(refs, vec!["a", "c"]);
        assert_eq!(extraction.bom.dependencies().len(), 1);
        assert_eq!(extraction.bom.dependencies()[0].reference, "root");
    }

    #[test]
    fn test_extract_top_level_without_root_is_degraded_passthrough() {
        let mut bom = sample();
        bom.metadata = None;
        let extraction = extract_top_level(bom);
        assert!(extraction.degraded);
        assert_eq!(extraction.bom.components.len(), 3);
        assert_eq!(extraction.bom.dependencies().len(), 3);
    }

    #[test]
    fn test_filter_dev_dependencies_prunes_components_and_edges() {
        let filtered = filter_dev_dependencies(sample());
        assert_eq!(filtered.components.len(), 2);
        let deps = filtered.dependencies();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].reference, "root");
        assert_eq!(deps[0].depends_on, vec!["a"]);
        assert_eq!(deps[1].reference, "a");
    }
}
