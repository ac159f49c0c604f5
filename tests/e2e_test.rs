/// End-to-end tests for the CLI
///
/// Only subcommands that need no external tools are exercised here.
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;

const WEB_V1: &str = "tests/fixtures/web-v1.json";
const WEB_RENAMED: &str = "tests/fixtures/web-renamed-root.json";
const NOT_JSON: &str = "tests/fixtures/not-json.txt";

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

// Exit code tests for CLI
mod exit_code_tests {
    use super::*;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("rebom").arg("--help").assert().code(0);
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("rebom").arg("--version").assert().code(0);
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_option() {
        cargo_bin_cmd!("rebom")
            .args(["digest", WEB_V1, "--invalid-option"])
            .assert()
            .code(2);
    }

    /// Exit code 2: missing subcommand
    #[test]
    fn test_exit_code_missing_subcommand() {
        cargo_bin_cmd!("rebom").assert().code(2);
    }

    /// Exit code 2: diff needs both sides
    #[test]
    fn test_exit_code_diff_without_to() {
        cargo_bin_cmd!("rebom")
            .args(["diff", "--from", WEB_V1])
            .assert()
            .code(2);
    }

    /// Exit code 3: Application error - missing input file
    #[test]
    fn test_exit_code_missing_file() {
        cargo_bin_cmd!("rebom")
            .args(["digest", "tests/fixtures/does-not-exist.json"])
            .assert()
            .code(3);
    }

    /// Exit code 3: Application error - input is not a BOM
    #[test]
    fn test_exit_code_invalid_document() {
        cargo_bin_cmd!("rebom")
            .args(["sanitize", NOT_JSON])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("BOM_VALIDATION_ERROR"));
    }

    /// Exit code 3: Application error - config file missing
    #[test]
    fn test_exit_code_missing_config() {
        cargo_bin_cmd!("rebom")
            .args(["--config", "tests/fixtures/missing.config.yml", "digest", WEB_V1])
            .assert()
            .code(3);
    }
}

#[test]
fn test_digest_ignores_root_identity_and_order() {
    let first = cargo_bin_cmd!("rebom")
        .args(["digest", WEB_V1])
        .output()
        .unwrap();
    let second = cargo_bin_cmd!("rebom")
        .args(["digest", WEB_RENAMED])
        .output()
        .unwrap();

    assert!(first.status.success());
    let digest = String::from_utf8(first.stdout.clone()).unwrap();
    assert_eq!(digest.trim().len(), 64);
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_sanitize_writes_output_file() {
    let output = tempfile::NamedTempFile::new().unwrap();
    cargo_bin_cmd!("rebom")
        .args(["sanitize", WEB_V1, "-o"])
        .arg(output.path())
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Output written to"));

    let content = std::fs::read(output.path()).unwrap();
    let bom: Value = serde_json::from_slice(&content).unwrap();
    assert_eq!(bom["bomFormat"], "CycloneDX");
}

#[test]
fn test_sanitize_removes_duplicate_components() {
    let output = cargo_bin_cmd!("rebom")
        .args(["sanitize", WEB_V1])
        .output()
        .unwrap();
    assert!(output.status.success());

    let bom = stdout_json(&output);
    assert_eq!(bom["components"].as_array().unwrap().len(), 2);
}

#[test]
fn test_augment_rewrites_root_component() {
    let output = cargo_bin_cmd!("rebom")
        .args([
            "augment",
            WEB_V1,
            "--name",
            "storefront",
            "--group",
            "com.acme",
            "--version",
            "3.1.0",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let bom = stdout_json(&output);
    let root = &bom["metadata"]["component"];
    assert_eq!(root["name"], "storefront");
    assert_eq!(root["version"], "3.1.0");
    assert!(root["purl"].as_str().unwrap().starts_with("pkg:npm/"));
    assert_eq!(bom["dependencies"][0]["ref"], root["bom-ref"]);
}

#[test]
fn test_augment_requires_full_identity() {
    cargo_bin_cmd!("rebom")
        .args(["augment", WEB_V1, "--name", "storefront"])
        .assert()
        .code(2);
}

#[test]
fn test_ingest_reconciles_identical_files() {
    let output = cargo_bin_cmd!("rebom")
        .env_remove("REBOM_ENRICHMENT_URI")
        .env_remove("REBOM_ENRICHMENT_API_KEY")
        .env_remove("REBOM_ARTIFACT_SERVICE_URL")
        .args(["ingest", WEB_V1, WEB_V1, WEB_RENAMED, "--org", "acme"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let records = stdout_json(&output);
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["bomVersion"], 1);
    assert_eq!(records[0]["organization"], "acme");
    assert_eq!(
        records[0]["serialNumber"],
        "urn:uuid:5f1d1c1e-8a0e-4c59-9d0c-9b7c2a6f3e11"
    );
    assert_eq!(records[0]["bomDigest"], records[1]["bomDigest"]);
}
