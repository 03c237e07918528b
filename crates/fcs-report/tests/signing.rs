// crates/fcs-report/tests/signing.rs
// ============================================================================
// Module: Report Signing Tests
// Description: Tests for PS256 report tokens and digest verification.
// Purpose: Confirm tokens verify and that every digest is enforced.
// ============================================================================
//! ## Overview
//! Exercises `ReportDigests`, `ReportSigner::sign` and `ReportVerifier::verify`
//! with RSA key fixtures.

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

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
use fcs_report::MAX_SIGNING_KEY_BYTES;
use fcs_report::ReportClaims;
use fcs_report::ReportDigests;
use fcs_report::ReportSigner;
use fcs_report::ReportVerifier;
use fcs_report::SignatureError;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use time::Duration;

use crate::common::NOW;
use crate::common::discovery;
use crate::common::fixture_root;
use crate::common::sample_report;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const MANIFEST: &[u8] = br#"{"scripts":[]}"#;

fn signer() -> ReportSigner {
    ReportSigner::from_file(&fixture_root().join("report-signing.pem")).unwrap()
}

fn digests() -> ReportDigests {
    ReportDigests::compute(&sample_report_fixed(), &discovery(), MANIFEST).unwrap()
}

fn sample_report_fixed() -> fcs_report::Report {
    let mut report = sample_report();
    report.id = "0f8e1a4c-5b2d-4e8f-9a1b-2c3d4e5f6a7b".to_string();
    report
}

fn claims() -> ReportClaims {
    ReportClaims::new(
        "fcs",
        "conformance-report",
        "0f8e1a4c-5b2d-4e8f-9a1b-2c3d4e5f6a7b",
        digests(),
        NOW,
        Duration::days(60),
    )
}

fn token(metadata: &Map<String, Value>) -> String {
    signer().sign(&claims(), metadata).unwrap()
}

fn header(token: &str) -> Value {
    let segment = token.split('.').next().unwrap();
    serde_json::from_slice(&BASE64URL.decode(segment).unwrap()).unwrap()
}

// ============================================================================
// SECTION: Round Trip
// ============================================================================

#[test]
fn signed_tokens_verify_with_the_public_key() {
    let token = token(&Map::new());
    let verifier = ReportVerifier::from_file(&fixture_root().join("report-signing.pub.pem")).unwrap();
    let verified = verifier.verify(&token, &digests(), NOW + Duration::hours(1)).unwrap();
    assert_eq!(verified, claims());
    assert_eq!(header(&token), json!({"alg": "PS256", "typ": "JWT"}));
}

#[test]
fn digests_are_stable_for_equal_inputs() {
    assert_eq!(digests(), digests());
    assert_eq!(digests().manifest.len(), 64);
}

#[test]
fn metadata_is_copied_without_overriding_alg() {
    let metadata: Map<String, Value> = serde_json::from_value(json!({
        "kid": "report-signing-2024",
        "alg": "none",
        "http://openbanking.org.uk/tan": "openbanking.org.uk"
    }))
    .unwrap();
    let token = token(&metadata);
    let header = header(&token);
    assert_eq!(header["alg"], "PS256");
    assert_eq!(header["kid"], "report-signing-2024");
    assert_eq!(header["http://openbanking.org.uk/tan"], "openbanking.org.uk");
    signer().verifier().verify(&token, &digests(), NOW).unwrap();
}

// ============================================================================
// SECTION: Digest Enforcement
// ============================================================================

#[test]
fn each_digest_mismatch_is_named() {
    let token = token(&Map::new());
    let verifier = signer().verifier();

    let mut expected = digests();
    expected.report = "00".repeat(32);
    assert_eq!(verifier.verify(&token, &expected, NOW).unwrap_err(), SignatureError::ReportDigestMismatch);

    let mut expected = digests();
    expected.discovery = "00".repeat(32);
    assert_eq!(verifier.verify(&token, &expected, NOW).unwrap_err(), SignatureError::DiscoveryDigestMismatch);

    let mut expected = digests();
    expected.manifest = "00".repeat(32);
    let err = verifier.verify(&token, &expected, NOW).unwrap_err();
    assert_eq!(err, SignatureError::ManifestDigestMismatch);
    assert_eq!(err.to_string(), "manifest digest mismatch");
}

#[test]
fn report_changes_alter_the_report_digest() {
    let mut changed = sample_report_fixed();
    changed.version = "v1.6.1".to_string();
    let changed = ReportDigests::compute(&changed, &discovery(), MANIFEST).unwrap();
    assert_ne!(changed.report, digests().report);
    assert_eq!(changed.discovery, digests().discovery);
}

// ============================================================================
// SECTION: Rejections
// ============================================================================

#[test]
fn validity_window_is_enforced() {
    let token = token(&Map::new());
    let verifier = signer().verifier();
    let err = verifier.verify(&token, &digests(), NOW - Duration::seconds(1)).unwrap_err();
    assert_eq!(err, SignatureError::NotYetValid);
    let err = verifier.verify(&token, &digests(), NOW + Duration::days(60)).unwrap_err();
    assert_eq!(err, SignatureError::Expired);
}

#[test]
fn foreign_keys_fail_verification() {
    let token = token(&Map::new());
    let other = ReportVerifier::from_file(&fixture_root().join("other-signing.pub.pem")).unwrap();
    let err = other.verify(&token, &digests(), NOW).unwrap_err();
    assert!(matches!(err, SignatureError::Verification(_)));
}

#[test]
fn tampered_claims_fail_verification() {
    let token = token(&Map::new());
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let mut claims: Value = serde_json::from_slice(&BASE64URL.decode(&parts[1]).unwrap()).unwrap();
    claims["manifestDigest"] = Value::String("00".repeat(32));
    parts[1] = BASE64URL.encode(serde_json::to_vec(&claims).unwrap());
    let err = signer().verifier().verify(&parts.join("."), &digests(), NOW).unwrap_err();
    assert!(matches!(err, SignatureError::Verification(_)));
}

#[test]
fn other_algorithms_are_refused() {
    let token = token(&Map::new());
    let forged_header = BASE64URL.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let rest = token.split_once('.').unwrap().1;
    let err = signer().verifier().verify(&format!("{forged_header}.{rest}"), &digests(), NOW).unwrap_err();
    assert_eq!(err, SignatureError::UnsupportedAlgorithm("RS256".to_string()));
}

#[test]
fn malformed_tokens_are_refused() {
    let verifier = signer().verifier();
    assert!(matches!(verifier.verify("a.b", &digests(), NOW), Err(SignatureError::Malformed(_))));
    assert!(matches!(verifier.verify("!!.??.**", &digests(), NOW), Err(SignatureError::Malformed(_))));
}

// ============================================================================
// SECTION: Keys
// ============================================================================

#[test]
fn invalid_and_oversized_keys_are_refused() {
    assert!(matches!(ReportSigner::from_pem("not a key"), Err(SignatureError::Key(_))));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.pem");
    fs::write(&path, vec![b'A'; MAX_SIGNING_KEY_BYTES + 1]).unwrap();
    let err = ReportSigner::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("exceeds"));
}
