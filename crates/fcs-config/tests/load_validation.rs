// crates/fcs-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// ============================================================================
//! ## Overview
//! Exercises `FcsConfig::load` against files on disk.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io::Write;
use std::path::Path;

use fcs_config::ConfigError;
use fcs_config::FcsConfig;
use fcs_config::LogSink;
use fcs_config::MAX_CONFIG_FILE_SIZE;
use tempfile::NamedTempFile;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn write_config(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file
}

fn assert_invalid(result: Result<FcsConfig, ConfigError>, needle: &str) {
    match result {
        Err(error) => {
            let message = error.to_string();
            assert!(message.contains(needle), "error {message} did not contain {needle}");
        }
        Ok(_) => panic!("expected invalid config load"),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn load_reads_a_complete_file() {
    let file = write_config(
        br#"
discovery = "file://config/discovery.json"
api_versions = ["3.1.8"]

[context]
x-fapi-financial-id = "0015800001041RHAAY"

[runner]
timeout_secs = 60
results_capacity = 16

[http]
request_timeout_secs = 10
long_timeout_secs = 120
insecure_skip_verify = false

[report]
issuer = "ozone"
subject = "ozone-report"
validity_secs = 86400
signing_key = "keys/report.pem"

[logging]
sink = "file"
path = "fcs-events.log"
"#,
    );
    let config = FcsConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.api_versions, vec!["3.1.8".to_string()]);
    assert_eq!(config.runner.results_capacity, 16);
    assert!(!config.http.insecure_skip_verify);
    assert_eq!(config.report.signing_key.as_deref(), Some("keys/report.pem"));
    assert_eq!(config.logging.sink, LogSink::File);
    let context = config.seed_context();
    assert_eq!(context.get_string("x-fapi-financial-id").unwrap(), "0015800001041RHAAY");
}

#[test]
fn load_applies_section_defaults() {
    let file = write_config(br#"discovery = "file://discovery.json""#);
    let config = FcsConfig::load(Some(file.path())).unwrap();
    assert!(config.api_versions.is_empty());
    assert_eq!(config.runner.timeout_secs, 300);
    assert_eq!(config.http.long_timeout_secs, 300);
    assert_eq!(config.report.issuer, "fcs");
    assert_eq!(config.logging.sink, LogSink::Stderr);
    assert!(config.seed_context().is_empty());
}

#[test]
fn load_rejects_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = FcsConfig::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn load_rejects_path_too_long() {
    let long_path = "a".repeat(5_000);
    assert_invalid(FcsConfig::load(Some(Path::new(&long_path))), "config path exceeds max length");
}

#[test]
fn load_rejects_path_component_too_long() {
    let long_component = "a".repeat(300);
    assert_invalid(FcsConfig::load(Some(Path::new(&long_component))), "config path component too long");
}

#[test]
fn load_rejects_oversized_file() {
    let file = write_config(&vec![b'a'; MAX_CONFIG_FILE_SIZE + 1]);
    assert_invalid(FcsConfig::load(Some(file.path())), "config file exceeds size limit");
}

#[test]
fn load_rejects_non_utf8_file() {
    let file = write_config(&[0xFF, 0xFE, 0xFF]);
    assert_invalid(FcsConfig::load(Some(file.path())), "config file must be utf-8");
}

#[test]
fn load_rejects_malformed_toml() {
    let file = write_config(b"discovery = ");
    assert!(matches!(FcsConfig::load(Some(file.path())), Err(ConfigError::Parse(_))));
}
