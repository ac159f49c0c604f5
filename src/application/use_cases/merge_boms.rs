use crate::application::dto::{MergeOutcome, MergeRequest};
use crate::application::use_cases::add_bom::{AddBomUseCase, PreparedBom};
use crate::application::use_cases::engine_context::EngineContext;
use crate::application::use_cases::find_bom::FindBomUseCase;
use crate::bom_processing::domain::identifiers::generate_serial_number;
use crate::bom_processing::domain::{Bom, BomMeta, BomOptions, BomRecord, BomState, SourceFormat};
use crate::bom_processing::services::{
    attach_engine_tool, compute_bom_digest, establish_purl, extract_top_level,
    filter_dev_dependencies, sha256_hex,
};
use crate::ports::outbound::ToolInvocation;
use crate::shared::error::{RebomError, ValidationDetails};
use crate::shared::{Result, ScratchFile};
use chrono::{SecondsFormat, Utc};

const DEFAULT_SPEC_VERSION: &str = "1.6";
const DEFAULT_BOM_FORMAT: &str = "CycloneDX";

/// MergeBomsUseCase - combines stored BOMs through the external merge tool
///
/// Inputs are optionally reduced to top-level or production dependencies
/// before being handed over; the tool's output goes through the sanitize
/// pipeline like any other untrusted document.
#[derive(Clone)]
pub struct MergeBomsUseCase {
    ctx: EngineContext,
    finder: FindBomUseCase,
    add_bom: AddBomUseCase,
}

impl MergeBomsUseCase {
    pub fn new(ctx: EngineContext, finder: FindBomUseCase, add_bom: AddBomUseCase) -> Self {
        Self {
            ctx,
            finder,
            add_bom,
        }
    }

    pub async fn merge(&self, request: &MergeRequest) -> Result<MergeOutcome> {
        if request.ids.is_empty() {
            return Err(RebomError::validation("merge requires at least one BOM id").into());
        }

        let mut boms = Vec::with_capacity(request.ids.len());
        for id in &request.ids {
            boms.push(self.finder.find_bom_by_id(id, &request.organization).await?);
        }
        self.merge_documents(boms, &request.options, &request.ids)
            .await
    }

    /// Merges already loaded documents. `labels` name the inputs in
    /// warnings and errors.
    pub async fn merge_documents(
        &self,
        boms: Vec<Bom>,
        options: &BomOptions,
        labels: &[String],
    ) -> Result<MergeOutcome> {
        let (Some(name), Some(group), Some(version)) =
            (&options.name, &options.group, &options.version)
        else {
            return Err(RebomError::Validation {
                message: "merge requires a target name, group and version".to_string(),
                details: Some(ValidationDetails::field(
                    "name/group/version",
                    "required",
                )),
            }
            .into());
        };
        let purl = establish_purl(None, options)?;

        let mut warnings = Vec::new();
        let mut inputs = Vec::with_capacity(boms.len());
        for (index, bom) in boms.into_iter().enumerate() {
            let label = labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("#{}", index));
            let bom = Self::prepare_input(bom, options, &label, &mut warnings);
            inputs.push(ScratchFile::with_content(bom.to_json_string()?.as_bytes()).await?);
        }

        let mut invocation =
            ToolInvocation::new(&self.ctx.tools.programs.merge, self.ctx.tools.timeouts.merge)
                .args(["bomutils", "merge-boms"]);
        if let Some(mode) = options.root_component_merge_mode {
            invocation = invocation
                .arg("--root-component-merge-mode")
                .arg(mode.as_str());
        }
        invocation = invocation
            .arg("--structure")
            .arg(options.structure.as_str())
            .arg("--group")
            .arg(group)
            .arg("--name")
            .arg(name)
            .arg("--version")
            .arg(version);
        for input in &inputs {
            invocation = invocation.arg("--input-files").arg(input.arg());
        }
        invocation = invocation.arg("--purl").arg(purl);

        let stdout = self
            .ctx
            .tool_runner
            .execute(&invocation)
            .await
            .map_err(|e| merge_error(&e, labels, "merge tool failed"))?;
        drop(inputs);

        let bom = self.post_process(&stdout, labels).await?;
        tracing::info!(
            inputs = labels.len(),
            components = bom.components.len(),
            "Merged BOMs"
        );
        Ok(MergeOutcome { bom, warnings })
    }

    /// Merges and persists the result as a new catalog record.
    pub async fn merge_and_store(&self, request: &MergeRequest) -> Result<BomRecord> {
        let MergeOutcome { mut bom, warnings } = self.merge(request).await?;
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Merge completed with warning");
        }

        let serial_number = request
            .options
            .serial_number
            .clone()
            .unwrap_or_else(generate_serial_number);
        bom.serial_number = Some(serial_number.clone());

        let mut options = request.options.clone();
        options.serial_number = Some(serial_number.clone());
        let mut meta = BomMeta::from_options(&options, BomState::Merged);
        meta.source_ids = request.ids.clone();

        let raw = bom.to_json_string()?.into_bytes();
        let prepared = PreparedBom {
            original_file_digest: sha256_hex(&raw),
            bom_digest: compute_bom_digest(&bom)?,
            raw,
            bom,
            serial_number,
            meta,
            source_format: SourceFormat::CycloneDx,
            source_spdx_uuid: None,
        };
        self.add_bom
            .persist(prepared, &request.organization)
            .await
    }

    fn prepare_input(
        mut bom: Bom,
        options: &BomOptions,
        label: &str,
        warnings: &mut Vec<String>,
    ) -> Bom {
        if options.tld_only {
            let extraction = extract_top_level(bom);
            if extraction.degraded {
                warnings.push(format!(
                    "BOM {} has no resolvable root dependency; merged without top-level extraction",
                    label
                ));
            }
            bom = extraction.bom;
        }
        if options.ignore_dev {
            bom = filter_dev_dependencies(bom);
        }
        bom
    }

    async fn post_process(&self, stdout: &str, labels: &[String]) -> Result<Bom> {
        let mut bom = Bom::from_json_str(stdout).map_err(|e| {
            merge_error(&anyhow::Error::from(e), labels, "merge tool returned malformed JSON")
        })?;

        if bom.spec_version.is_none() {
            bom.spec_version = Some(DEFAULT_SPEC_VERSION.to_string());
        }
        if bom.bom_format.is_none() {
            bom.bom_format = Some(DEFAULT_BOM_FORMAT.to_string());
        }
        let metadata = bom.metadata_mut();
        if metadata.timestamp.is_none() {
            metadata.timestamp = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        }
        metadata.tools = None;

        let mut bom = self.ctx.pipeline().process_bom(&bom).await?;
        attach_engine_tool(&mut bom);
        Ok(bom)
    }
}

fn merge_error(cause: &anyhow::Error, labels: &[String], message: &str) -> anyhow::Error {
    tracing::error!(bom_ids = ?labels, error = %format!("{:#}", cause), "BOM merge failed");
    RebomError::Merge {
        message: message.to_string(),
        bom_ids: labels.to_vec(),
    }
    .into()
}
