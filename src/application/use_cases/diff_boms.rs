use crate::application::dto::DiffRequest;
use crate::application::use_cases::engine_context::EngineContext;
use crate::application::use_cases::find_bom::FindBomUseCase;
use crate::application::use_cases::merge_boms::MergeBomsUseCase;
use crate::bom_processing::domain::{Bom, BomOptions, ComponentDiff, ComponentVersion};
use crate::bom_processing::services::override_root_component;
use crate::ports::outbound::ToolInvocation;
use crate::shared::error::RebomError;
use crate::shared::{Result, ScratchFile};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;

const DIFF_NAME: &str = "diff-temp";
const DIFF_GROUP: &str = "rearmrebom";
const DIFF_VERSION: &str = "1";

#[derive(Debug, Deserialize)]
struct DiffReport {
    #[serde(rename = "componentVersions", default)]
    component_versions: BTreeMap<String, DiffGroup>,
}

#[derive(Debug, Default, Deserialize)]
struct DiffGroup {
    #[serde(default)]
    added: Vec<DiffEntry>,
    #[serde(default)]
    removed: Vec<DiffEntry>,
}

#[derive(Debug, Deserialize)]
struct DiffEntry {
    purl: Option<String>,
    version: Option<String>,
}

impl DiffEntry {
    fn into_component(self) -> Option<ComponentVersion> {
        let purl = self.purl?;
        Some(ComponentVersion::new(purl, self.version.unwrap_or_default()))
    }
}

/// DiffBomsUseCase - component-version comparison of two BOM sets
///
/// Each side is merged on its own first. Diff is read-only and never writes
/// to the catalog.
#[derive(Clone)]
pub struct DiffBomsUseCase {
    ctx: EngineContext,
    finder: FindBomUseCase,
    merger: MergeBomsUseCase,
}

impl DiffBomsUseCase {
    pub fn new(ctx: EngineContext, finder: FindBomUseCase, merger: MergeBomsUseCase) -> Self {
        Self {
            ctx,
            finder,
            merger,
        }
    }

    pub async fn execute(&self, request: &DiffRequest) -> Result<ComponentDiff> {
        let from = self.load_side(&request.from_ids, &request.organization).await?;
        let to = self.load_side(&request.to_ids, &request.organization).await?;
        self.diff_documents(from, &request.from_ids, to, &request.to_ids)
            .await
    }

    /// Compares two sets of loaded documents.
    pub async fn diff_documents(
        &self,
        from: Vec<Bom>,
        from_labels: &[String],
        to: Vec<Bom>,
        to_labels: &[String],
    ) -> Result<ComponentDiff> {
        let from = self.merge_side(from, from_labels).await?;
        let to = self.merge_side(to, to_labels).await?;

        let from_file = ScratchFile::with_content(from.to_json_string()?.as_bytes()).await?;
        let to_file = ScratchFile::with_content(to.to_json_string()?.as_bytes()).await?;

        // The tool reports as added whatever the first file has and the second lacks.
        let invocation =
            ToolInvocation::new(&self.ctx.tools.programs.diff, self.ctx.tools.timeouts.diff)
                .arg("diff")
                .args([
                    "--from-format",
                    "json",
                    "--to-format",
                    "json",
                    "--output-format",
                    "json",
                    "--component-versions",
                ])
                .arg(to_file.arg())
                .arg(from_file.arg());
        let stdout = self.ctx.tool_runner.execute(&invocation).await?;

        let report: DiffReport = serde_json::from_str(&stdout).map_err(|e| {
            tracing::error!(error = %e, "Diff tool returned malformed JSON");
            RebomError::tool(&self.ctx.tools.programs.diff, "diff output is not valid JSON")
        })?;
        let diff = flatten(report);
        tracing::info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            "Computed component diff"
        );
        Ok(diff)
    }

    async fn load_side(&self, ids: &[String], organization: &str) -> Result<Vec<Bom>> {
        let mut boms = Vec::with_capacity(ids.len());
        for id in ids {
            boms.push(self.finder.find_bom_by_id(id, organization).await?);
        }
        Ok(boms)
    }

    /// Re-stamps every input with a throwaway root so root components never
    /// show up as differences, then merges the side.
    async fn merge_side(&self, boms: Vec<Bom>, labels: &[String]) -> Result<Bom> {
        if boms.is_empty() {
            return Err(RebomError::validation("diff requires at least one BOM on each side").into());
        }
        let options = BomOptions::with_identity(DIFF_NAME, DIFF_GROUP, DIFF_VERSION);
        let now = Utc::now();

        let mut stamped = Vec::with_capacity(boms.len());
        for (index, bom) in boms.into_iter().enumerate() {
            let item_options = BomOptions {
                version: Some(format!("1{}", index)),
                purl: Some(format!("pkg:generic/diff/test@{}", index)),
                ..options.clone()
            };
            stamped.push(override_root_component(bom, &item_options, Some(now))?);
        }

        Ok(self
            .merger
            .merge_documents(stamped, &options, labels)
            .await?
            .bom)
    }
}

fn flatten(report: DiffReport) -> ComponentDiff {
    let mut diff = ComponentDiff::default();
    for (group, entries) in report.component_versions {
        tracing::debug!(
            group = %group,
            added = entries.added.len(),
            removed = entries.removed.len(),
            "Diff group"
        );
        diff.added
            .extend(entries.added.into_iter().filter_map(DiffEntry::into_component));
        diff.removed
            .extend(entries.removed.into_iter().filter_map(DiffEntry::into_component));
    }
    diff
}
