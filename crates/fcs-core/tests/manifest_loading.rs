// crates/fcs-core/tests/manifest_loading.rs
// ============================================================================
// Module: Manifest Loading Tests
// Description: Tests for manifest, reference and discovery loading.
// Purpose: Confirm file resolution, catalogue merging and discovery validation.
// ============================================================================
//! ## Overview
//! Loads the fixture manifests and discovery document through `ManifestSource`.

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
#![allow(dead_code, reason = "Common module may have unused helpers.")]

mod common;

use std::fs;

use fcs_core::DEFAULT_ASSERTIONS_URI;
use fcs_core::DEFAULT_DATA_URI;
use fcs_core::DiscoveryError;
use fcs_core::ManifestError;
use fcs_core::ManifestSource;
use fcs_core::load_discovery;
use fcs_core::load_manifest;
use fcs_core::load_manifest_bytes;
use fcs_core::load_references;
use serde_json::Value;

use crate::common::fixture_source;

// ============================================================================
// SECTION: Manifests
// ============================================================================

#[test]
fn manifest_loads_scripts_in_file_order() {
    let versions = vec!["v3.1.8".to_string()];
    let manifest =
        load_manifest(&fixture_source(), "file://manifests/ob_3.1_payment_fca.json", Some(&versions)).unwrap();
    assert_eq!(manifest.name, "Payment Initiation API");
    let ids: Vec<&str> = manifest.scripts.iter().map(|script| script.id.as_str()).collect();
    assert_eq!(ids, vec!["OB-301-DOP-100100", "OB-301-DOP-100200"]);
    assert!(manifest.scripts[0].use_ccg_token);
}

#[test]
fn manifest_without_version_context_is_rejected() {
    let err = load_manifest(&fixture_source(), "file://manifests/ob_3.1_payment_fca.json", None).unwrap_err();
    assert!(matches!(err, ManifestError::MissingVersionContext(_)));
    let err = load_manifest_bytes(&fixture_source(), "file://manifests/ob_3.1_payment_fca.json", None).unwrap_err();
    assert_eq!(
        err,
        ManifestError::MissingVersionContext("file://manifests/ob_3.1_payment_fca.json".to_string())
    );
}

#[test]
fn manifest_bytes_are_returned_with_the_manifest() {
    let versions = vec!["v3.1.8".to_string()];
    let uri = "file://manifests/ob_3.1_payment_fca.json";
    let (manifest, bytes) = load_manifest_bytes(&fixture_source(), uri, Some(&versions)).unwrap();
    assert_eq!(manifest.scripts.len(), 2);
    let expected = fs::read(crate::common::fixture_root().join("manifests").join("ob_3.1_payment_fca.json")).unwrap();
    assert_eq!(bytes, expected);
}

#[test]
fn remote_manifest_uri_is_not_implemented() {
    let versions = vec!["v3.1.8".to_string()];
    let err = load_manifest(&fixture_source(), "https://example.com/manifest.json", Some(&versions)).unwrap_err();
    assert_eq!(err, ManifestError::UnsupportedScheme("https: not implemented".to_string()));
}

#[test]
fn malformed_manifest_reports_decode_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), b"{\"scripts\": [").unwrap();
    let versions = vec!["v3.1.8".to_string()];
    let err = load_manifest(&ManifestSource::new(dir.path()), "file://broken.json", Some(&versions)).unwrap_err();
    assert!(matches!(err, ManifestError::DecodeFailure(message) if message.starts_with("file://broken.json")));
}

#[test]
fn missing_manifest_reports_source_unavailable() {
    let versions = vec!["v3.1.8".to_string()];
    let err = load_manifest(&fixture_source(), "file://manifests/absent.json", Some(&versions)).unwrap_err();
    assert!(matches!(err, ManifestError::SourceUnavailable(_)));
}

// ============================================================================
// SECTION: References
// ============================================================================

#[test]
fn references_merge_with_data_taking_precedence() {
    let references = load_references(&fixture_source(), DEFAULT_ASSERTIONS_URI, DEFAULT_DATA_URI).unwrap();
    assert_eq!(references.expect("OB3GLOAssertOn200").unwrap().status_code, 200);
    assert!(references.expect("OB3GLOShadowed").is_none());
    assert_eq!(references.body_data("OB3GLOShadowed"), Some("{\"shadowed\":true}"));
}

#[test]
fn structured_bodies_are_canonicalized() {
    let references = load_references(&fixture_source(), DEFAULT_ASSERTIONS_URI, DEFAULT_DATA_URI).unwrap();
    let body = references.body_data("OBWriteDomesticConsent").unwrap();
    assert!(body.starts_with("{\"Data\":{\"Initiation\":{\"EndToEndIdentification\""));
    let parsed: Value = serde_json::from_str(body).unwrap();
    assert_eq!(parsed["Data"]["Initiation"]["InstructedAmount"]["Currency"], "GBP");
    assert!(references.get("OBWriteDomesticConsent").unwrap().body.is_none());
}

#[test]
fn context_put_assertions_decode_alias_keys() {
    let references = load_references(&fixture_source(), DEFAULT_ASSERTIONS_URI, DEFAULT_DATA_URI).unwrap();
    let expect = references.expect("OB3DOPAssertConsentId").unwrap();
    let put = expect.context_put.as_ref().unwrap();
    assert_eq!(put.matches[0].context_name, "OB3DOPConsentId");
    assert_eq!(put.matches[0].json, "Data.ConsentId");
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

#[test]
fn discovery_loads_and_validates() {
    let model = load_discovery(&fixture_source(), "file://discovery.json").unwrap();
    assert_eq!(model.discovery_items.len(), 2);
    let accounts = &model.discovery_items[0];
    assert!(accounts.api_specification.schema_url().contains("account-info"));
    assert_eq!(accounts.resource_ids.get("statementId").map(String::as_str), Some("140000000000000000000001"));
}

#[test]
fn discovery_without_items_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("discovery.json"), br#"{"discoveryModel": {"discoveryItems": []}}"#).unwrap();
    let err = load_discovery(&ManifestSource::new(dir.path()), "discovery.json").unwrap_err();
    assert_eq!(err, DiscoveryError::Invalid("discoveryItems must be non-empty".to_string()));
}

#[test]
fn discovery_endpoint_paths_must_be_absolute() {
    let dir = tempfile::tempdir().unwrap();
    let document = r#"{"discoveryModel": {"discoveryItems": [{
        "apiSpecification": {"name": "a", "url": "https://x/account-info-swagger.json", "version": "v3.1.8"},
        "resourceBaseUri": "https://rs.example.com",
        "endpoints": [{"method": "GET", "path": "accounts"}]
    }]}}"#;
    fs::write(dir.path().join("discovery.json"), document).unwrap();
    let err = load_discovery(&ManifestSource::new(dir.path()), "discovery.json").unwrap_err();
    assert!(matches!(err, DiscoveryError::Invalid(message) if message.contains("must start with /")));
}

#[test]
fn unreadable_discovery_reports_io() {
    let err = load_discovery(&fixture_source(), "absent-discovery.json").unwrap_err();
    assert!(matches!(err, DiscoveryError::Io(_)));
}
