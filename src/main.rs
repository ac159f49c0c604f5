mod cli;

use chrono::Utc;
use cli::{Args, Command};
use owo_colors::OwoColorize;
use rebom::application::factories::{Engine, EngineFactory};
use rebom::application::dto::{AddBomRequest, SpdxIngestRequest};
use rebom::bom_processing::domain::{Bom, BomOptions, BomRecord};
use rebom::bom_processing::services::{
    attach_engine_tool, compute_bom_digest, override_root_component, BomSanitizer,
};
use rebom::config::{discover_config, load_config_from_path, EngineConfig};
use rebom::ports::inbound::BomCatalogPort;
use rebom::ports::outbound::CatalogRepository;
use rebom::shared::error::{ErrorCode, ExitCode, RebomError};
use rebom::shared::Result;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "warn";

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    if let Err(e) = run(args).await {
        report_error(&e);
        process::exit(ExitCode::ApplicationError.as_i32());
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?.with_overrides(args.overrides())?;
    init_logging(config.log_level.as_deref());
    let engine = EngineFactory::build(&config)?;

    match args.command {
        Command::Digest { file } => {
            let bom = read_bom(&file)?;
            println!("{}", compute_bom_digest(&bom)?);
        }
        Command::Sanitize { file, output } => {
            let bom = sanitize_file(&engine, &file).await?;
            emit(&serde_json::to_string_pretty(&bom)?, output.as_deref())?;
        }
        Command::Augment {
            file,
            identity,
            purl,
            belongs_to,
            hash,
            output,
        } => {
            let options = BomOptions {
                purl,
                belongs_to,
                hash,
                ..identity.to_options()
            };
            let bom = sanitize_file(&engine, &file).await?;
            let mut bom = override_root_component(bom, &options, Some(Utc::now()))?;
            attach_engine_tool(&mut bom);
            emit(&serde_json::to_string_pretty(&bom)?, output.as_deref())?;
        }
        Command::Merge {
            files,
            identity,
            structure,
            tld_only,
            ignore_dev,
            root_merge_mode,
            output,
        } => {
            let options = BomOptions {
                structure,
                tld_only,
                ignore_dev,
                root_component_merge_mode: root_merge_mode,
                ..identity.to_options()
            };
            let (boms, labels) = sanitize_files(&engine, &files).await?;
            let outcome = engine
                .service
                .merger()
                .merge_documents(boms, &options, &labels)
                .await?;
            for warning in &outcome.warnings {
                eprintln!("{} {}", "⚠️  Warning:".yellow(), warning);
            }
            emit(&serde_json::to_string_pretty(&outcome.bom)?, output.as_deref())?;
        }
        Command::Diff { from, to } => {
            let (from_boms, from_labels) = sanitize_files(&engine, &from).await?;
            let (to_boms, to_labels) = sanitize_files(&engine, &to).await?;
            let diff = engine
                .service
                .differ()
                .diff_documents(from_boms, &from_labels, to_boms, &to_labels)
                .await?;
            println!("{}", serde_json::to_string_pretty(&diff)?);
        }
        Command::Ingest { files, org } => {
            let records = ingest_files(&engine, &files, &org).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    if let Some(path) = &args.config {
        return load_config_from_path(path);
    }
    let cwd = std::env::current_dir()?;
    Ok(discover_config(&cwd)?.unwrap_or_default())
}

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_LEVEL)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to read {}: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display(),
            e
        )
    })
}

fn read_bom(path: &Path) -> Result<Bom> {
    let bytes = read_file(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let bom = Bom::from_json_str(&BomSanitizer::sanitize_text(&text)).map_err(|e| {
        RebomError::validation(format!(
            "{} is not a CycloneDX JSON document: {}",
            path.display(),
            e
        ))
    })?;
    Ok(BomSanitizer::deduplicate(bom))
}

async fn sanitize_file(engine: &Engine, path: &Path) -> Result<Bom> {
    let bytes = read_file(path)?;
    engine
        .context
        .pipeline()
        .process_text(&String::from_utf8_lossy(&bytes))
        .await
}

async fn sanitize_files(engine: &Engine, paths: &[PathBuf]) -> Result<(Vec<Bom>, Vec<String>)> {
    let mut boms = Vec::with_capacity(paths.len());
    let mut labels = Vec::with_capacity(paths.len());
    for path in paths {
        boms.push(sanitize_file(engine, path).await?);
        labels.push(path.display().to_string());
    }
    Ok((boms, labels))
}

async fn ingest_files(engine: &Engine, paths: &[PathBuf], org: &str) -> Result<Vec<BomRecord>> {
    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = read_file(path)?;
        let record = if is_spdx(&bytes) {
            engine
                .service
                .ingest_spdx(SpdxIngestRequest::new(bytes, org))
                .await?
        } else {
            engine
                .service
                .add_bom(AddBomRequest::new(bytes, BomOptions::default(), org))
                .await?
        };
        eprintln!(
            "✅ {} -> {} (version {})",
            path.display(),
            record.serial_number,
            record.bom_version
        );
        records.push(record);
    }

    if engine.scheduler.is_enabled() {
        let summary = engine.scheduler.run_cycle().await?;
        eprintln!(
            "🔎 Enrichment: {} completed, {} failed",
            summary.completed, summary.failed
        );
        let mut refreshed = Vec::with_capacity(records.len());
        for record in records {
            let current = engine
                .context
                .catalog
                .find_by_uuid(&record.uuid, org)
                .await?
                .unwrap_or(record);
            refreshed.push(current);
        }
        records = refreshed;
    }

    // Re-ingesting identical content returns the same record more than once.
    records.dedup_by_key(|r| r.uuid);
    Ok(records)
}

fn is_spdx(bytes: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .map(|v| v.get("spdxVersion").is_some())
        .unwrap_or(false)
}

fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
            eprintln!("✅ Output written to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn report_error(error: &anyhow::Error) {
    eprintln!("\n{}\n", "❌ An error occurred:".red().bold());
    eprintln!("[{}] {}", ErrorCode::of(error), error);

    if let Some(RebomError::Validation {
        details: Some(details),
        ..
    }) = error.downcast_ref::<RebomError>()
    {
        for issue in &details.issues {
            eprintln!("  - {}", issue);
        }
    }

    // Display error chain
    for cause in error.chain().skip(1) {
        eprintln!("\n{} {}", "Caused by:".dimmed(), cause);
    }
    eprintln!();
}
