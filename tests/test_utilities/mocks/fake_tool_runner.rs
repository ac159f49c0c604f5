use async_trait::async_trait;
use rebom::prelude::*;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// In-process stand-in for the external tools
///
/// - `bomutils merge-boms` concatenates the components of every input file
///   as-is, duplicates included
/// - `diff` reports components present in the first file and not the second
///   as added, the reverse as removed
/// - `bomutils convert-spdx` turns SPDX packages into CycloneDX components
/// - `bomutils enrich` copies the input and tags every component
/// - `validate` accepts everything
pub struct FakeToolRunner {
    fail_on: Mutex<Option<String>>,
    invocations: Mutex<Vec<ToolInvocation>>,
}

impl FakeToolRunner {
    pub fn new() -> Self {
        Self {
            fail_on: Mutex::new(None),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Fails every invocation whose arguments contain `subcommand`
    pub fn failing_on(subcommand: &str) -> Self {
        Self {
            fail_on: Mutex::new(Some(subcommand.to_string())),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Lets every invocation through again
    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn read_json(path: &str) -> Result<Value> {
        let content = std::fs::read(path)?;
        Ok(serde_json::from_slice(&content)?)
    }

    fn merge(invocation: &ToolInvocation) -> Result<String> {
        let inputs: Vec<&str> = invocation
            .args
            .windows(2)
            .filter(|pair| pair[0] == "--input-files")
            .map(|pair| pair[1].as_str())
            .collect();

        let mut components = Vec::new();
        for input in inputs {
            let bom = Self::read_json(input)?;
            if let Some(list) = bom.get("components").and_then(Value::as_array) {
                components.extend(list.iter().cloned());
            }
        }
        let purl = invocation.flag_value("--purl").unwrap_or_default();
        let refs: Vec<Value> = components
            .iter()
            .filter_map(|c| c.get("purl").cloned())
            .collect();

        Ok(json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "version": 1,
            "metadata": {
                "tools": [{"vendor": "fake", "name": "merge"}],
                "component": {
                    "type": "application",
                    "name": invocation.flag_value("--name"),
                    "group": invocation.flag_value("--group"),
                    "version": invocation.flag_value("--version"),
                    "purl": purl,
                    "bom-ref": purl
                }
            },
            "components": components,
            "dependencies": [{"ref": purl, "dependsOn": refs}]
        })
        .to_string())
    }

    fn component_set(bom: &Value) -> Vec<(String, String, String)> {
        bom.get("components")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .map(|c| {
                        let field = |name: &str| {
                            c.get(name)
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string()
                        };
                        (field("name"), field("purl"), field("version"))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn diff(invocation: &ToolInvocation) -> Result<String> {
        let n = invocation.args.len();
        let first = Self::component_set(&Self::read_json(&invocation.args[n - 2])?);
        let second = Self::component_set(&Self::read_json(&invocation.args[n - 1])?);

        let first_purls: HashSet<&str> = first.iter().map(|(_, p, _)| p.as_str()).collect();
        let second_purls: HashSet<&str> = second.iter().map(|(_, p, _)| p.as_str()).collect();

        let mut groups: BTreeMap<String, (Vec<Value>, Vec<Value>)> = BTreeMap::new();
        for (name, purl, version) in &first {
            if !second_purls.contains(purl.as_str()) {
                groups
                    .entry(name.clone())
                    .or_default()
                    .0
                    .push(json!({"purl": purl, "version": version}));
            }
        }
        for (name, purl, version) in &second {
            if !first_purls.contains(purl.as_str()) {
                groups
                    .entry(name.clone())
                    .or_default()
                    .1
                    .push(json!({"purl": purl, "version": version}));
            }
        }

        let component_versions: serde_json::Map<String, Value> = groups
            .into_iter()
            .map(|(name, (added, removed))| {
                (name, json!({"added": added, "removed": removed, "unchanged": []}))
            })
            .collect();
        Ok(json!({ "componentVersions": component_versions }).to_string())
    }

    fn convert(invocation: &ToolInvocation) -> Result<String> {
        let infile = invocation.flag_value("--infile").unwrap_or_default();
        let outfile = invocation.flag_value("--outfile").unwrap_or_default();
        let spdx = Self::read_json(infile)?;

        let components: Vec<Value> = spdx
            .get("packages")
            .and_then(Value::as_array)
            .map(|packages| {
                packages
                    .iter()
                    .map(|p| {
                        let name = p.get("name").and_then(Value::as_str).unwrap_or("unknown");
                        let version = p.get("versionInfo").and_then(Value::as_str).unwrap_or("0");
                        json!({
                            "type": "library",
                            "name": name,
                            "version": version,
                            "purl": format!("pkg:generic/{}@{}", name, version)
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let converted = json!({
            "bomFormat": "CycloneDX",
            "specVersion": "1.6",
            "version": 1,
            "components": components
        });
        std::fs::write(outfile, converted.to_string())?;
        Ok(String::new())
    }

    fn enrich(invocation: &ToolInvocation) -> Result<String> {
        let infile = invocation.flag_value("--infile").unwrap_or_default();
        let outfile = invocation.flag_value("--outfile").unwrap_or_default();
        let mut bom = Self::read_json(infile)?;
        if let Some(components) = bom.get_mut("components").and_then(Value::as_array_mut) {
            for component in components {
                component["properties"] = json!([{"name": "enriched", "value": "true"}]);
            }
        }
        std::fs::write(outfile, bom.to_string())?;
        Ok(String::new())
    }
}

#[async_trait]
impl ToolRunner for FakeToolRunner {
    async fn execute(&self, invocation: &ToolInvocation) -> Result<String> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let has = |arg: &str| invocation.args.iter().any(|a| a == arg);
        let fail_on = self.fail_on.lock().unwrap().clone();
        if let Some(fail_on) = fail_on {
            if has(&fail_on) {
                return Err(RebomError::tool(&invocation.program, "mock tool failure").into());
            }
        }

        if has("merge-boms") {
            Self::merge(invocation)
        } else if has("convert-spdx") {
            Self::convert(invocation)
        } else if has("enrich") {
            Self::enrich(invocation)
        } else if invocation.args.first().map(String::as_str) == Some("diff") {
            Self::diff(invocation)
        } else if invocation.args.first().map(String::as_str) == Some("validate") {
            Ok(String::new())
        } else {
            anyhow::bail!("FakeToolRunner: unexpected invocation {}", invocation.command_line())
        }
    }
}
