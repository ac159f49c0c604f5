use crate::bom_processing::domain::Component;

/// A property convention one ecosystem uses to flag development-scope components.
#[derive(Debug, Clone, Copy)]
struct DevScopeMarker {
    ecosystem: &'static str,
    property: &'static str,
    dev_values: &'static [&'static str],
}

const DEV_SCOPE_MARKERS: &[DevScopeMarker] = &[
    DevScopeMarker {
        ecosystem: "maven",
        property: "cdx:maven:component_scope",
        dev_values: &["test"],
    },
    DevScopeMarker {
        ecosystem: "npm",
        property: "cdx:npm:package:development",
        dev_values: &["true"],
    },
    DevScopeMarker {
        ecosystem: "nuget",
        property: "cdx:nuget:development",
        dev_values: &["true"],
    },
    DevScopeMarker {
        ecosystem: "golang",
        property: "cdx:go:build_tag",
        dev_values: &["test", "testing", "dev", "development"],
    },
    DevScopeMarker {
        ecosystem: "gradle",
        property: "cdx:gradle:component_scope",
        dev_values: &["testImplementation", "testCompile", "testRuntime"],
    },
];

/// DevDependencyPolicy decides whether a component is development-only.
pub struct DevDependencyPolicy;

impl DevDependencyPolicy {
    pub fn is_dev_dependency(component: &Component) -> bool {
        DEV_SCOPE_MARKERS.iter().any(|marker| {
            let matched = component
                .property(marker.property)
                .is_some_and(|value| marker.dev_values.contains(&value));
            if matched {
                tracing::debug!(
                    ecosystem = marker.ecosystem,
                    bom_ref = component.bom_ref.as_deref().unwrap_or(""),
                    "Component marked as dev dependency"
                );
            }
            matched
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom_processing::domain::Property;

    fn component_with(name: &str, value: &str) -> Component {
        Component {
            name: Some("c".to_string()),
            properties: Some(vec![Property {
                name: name.to_string(),
                value: Some(value.to_string()),
            }]),
            ..Component::default()
        }
    }

    #[test]
    fn test_ecosystem_markers() {
        assert!(DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:maven:component_scope",
            "test"
        )));
        assert!(DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:npm:package:development",
            "true"
        )));
        assert!(DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:nuget:development",
            "true"
        )));
        assert!(DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:go:build_tag",
            "testing"
        )));
        assert!(DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:gradle:component_scope",
            "testRuntime"
        )));
    }

    #[test]
    fn test_production_components_are_not_flagged() {
        assert!(!DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:maven:component_scope",
            "compile"
        )));
        assert!(!DevDependencyPolicy::is_dev_dependency(&component_with(
            "cdx:npm:package:development",
            "false"
        )));
        assert!(!DevDependencyPolicy::is_dev_dependency(&Component::default()));
    }
}
