use crate::bom_processing::domain::Bom;
use crate::ports::outbound::SchemaValidator;
use crate::shared::Result;
use async_trait::async_trait;

const SUPPORTED_SPEC_VERSIONS: &[&str] = &["1.2", "1.3", "1.4", "1.5", "1.6"];

/// StructuralValidator adapter checking the CycloneDX invariants the engine relies on
///
/// It does not replace a full JSON-schema validation; it is the default when
/// no external validator is configured.
#[derive(Debug, Default, Clone)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn issues(bom: &Bom) -> Vec<String> {
        let mut issues = Vec::new();

        match bom.bom_format.as_deref() {
            Some("CycloneDX") => {}
            Some(other) => issues.push(format!("bomFormat must be 'CycloneDX', found '{}'", other)),
            None => issues.push("bomFormat is required".to_string()),
        }
        match bom.spec_version.as_deref() {
            Some(v) if SUPPORTED_SPEC_VERSIONS.contains(&v) => {}
            Some(v) => issues.push(format!("unsupported specVersion '{}'", v)),
            None => issues.push("specVersion is required".to_string()),
        }
        if bom.version == Some(0) {
            issues.push("version must be at least 1".to_string());
        }
        if let Some(serial) = bom.serial_number.as_deref() {
            if !serial.starts_with("urn:uuid:") {
                issues.push(format!("serialNumber '{}' is not a urn:uuid", serial));
            }
        }
        for (i, component) in bom.components.iter().enumerate() {
            if component.name.as_deref().map_or(true, str::is_empty) {
                issues.push(format!("components[{}].name is required", i));
            }
        }
        for (i, dependency) in bom.dependencies().iter().enumerate() {
            if dependency.reference.is_empty() {
                issues.push(format!("dependencies[{}].ref must not be empty", i));
            }
        }
        issues
    }
}

#[async_trait]
impl SchemaValidator for StructuralValidator {
    async fn validate(&self, bom: &Bom) -> Result<Option<Vec<String>>> {
        let issues = Self::issues(bom);
        Ok(if issues.is_empty() { None } else { Some(issues) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_valid_bom_has_no_issues() {
        let bom = Bom::from_value(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.5",
            "serialNumber": "urn:uuid:3e671687-395b-41f5-a30f-a58921a69b79",
            "version": 1,
            "components": [{ "name": "lodash" }],
            "dependencies": [{ "ref": "a" }]
        }))
        .unwrap();
        assert_eq!(StructuralValidator::new().validate(&bom).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_bom_reports_each_issue() {
        let bom = Bom::from_value(json!({
            "bomFormat": "SPDX",
            "specVersion": "2.0",
            "serialNumber": "not-a-urn",
            "components": [{ "version": "1" }],
            "dependencies": [{ "ref": "" }]
        }))
        .unwrap();
        let issues = StructuralValidator::new().validate(&bom).await.unwrap().unwrap();
        assert_eq!(issues.len(), 5);
    }
}
