// crates/fcs-runner/tests/certify.rs
// ============================================================================
// Module: Report Certification Tests
// Description: Builds, signs and verifies reports for the fixture plan.
// Purpose: Confirm report status, claim contents and digest enforcement.
// ============================================================================
//! ## Overview
//! Signs with the fixture RSA key pair at a pinned clock.

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

use fcs_config::ReportConfig;
use fcs_core::TestCaseId;
use fcs_core::TestResult;
use fcs_report::CertifiedBy;
use fcs_report::Environment;
use fcs_report::Report;
use fcs_report::ReportSigner;
use fcs_report::ReportStatus;
use fcs_report::ReportVerifier;
use fcs_report::export_report_file;
use fcs_report::import_report_file;
use fcs_runner::FULL_VERSION;
use fcs_runner::RunnerError;
use fcs_runner::TestPlan;
use fcs_runner::ValidatorMap;
use fcs_runner::build_report;
use fcs_runner::sign_report;
use fcs_runner::verify_report;
use time::Duration;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::common::fixture_discovery;
use crate::common::fixture_plan;
use crate::common::fixture_root;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Pinned signing clock.
const NOW: OffsetDateTime = datetime!(2024-03-01 12:00:00 UTC);

/// Returns a sandbox certification.
fn certified_by(environment: Environment, agreed: bool) -> CertifiedBy {
    CertifiedBy {
        environment,
        brand: "Ozone Bank".to_string(),
        authorised_by: "A. Tester".to_string(),
        job_title: "Conformance Lead".to_string(),
        agreed_terms_conditions: agreed,
    }
}

/// Returns one passing result per planned test case.
fn all_passing(plan: &TestPlan) -> Vec<TestResult> {
    plan.specifications
        .iter()
        .flat_map(|spec| spec.test_cases.iter())
        .map(|test_case| TestResult::passed(test_case.id.clone()))
        .collect()
}

/// Builds a sandbox report for `results`.
fn report(plan: &TestPlan, results: &[TestResult]) -> Report {
    let sandbox = certified_by(Environment::Sandbox, false);
    build_report(plan, &fixture_discovery(), results, sandbox, &ReportConfig::default(), NOW).unwrap()
}

/// Loads the fixture signing key.
fn signer() -> ReportSigner {
    ReportSigner::from_file(&fixture_root().join("keys").join("report-signing.pem")).unwrap()
}

/// Loads the fixture verification key.
fn verifier() -> ReportVerifier {
    ReportVerifier::from_file(&fixture_root().join("keys").join("report-signing.pub.pem")).unwrap()
}

// ============================================================================
// SECTION: Build
// ============================================================================

#[test]
fn report_status_follows_results() {
    let plan = fixture_plan(&ValidatorMap::new());
    let mut results = all_passing(&plan);
    let passed = report(&plan, &results);
    assert_eq!(passed.status, ReportStatus::Complete);
    assert_eq!(passed.version, FULL_VERSION);
    assert_eq!(passed.api_specifications.len(), 2);
    assert_eq!(passed.api_specifications[0].results.len(), 3);
    assert_eq!(passed.created, "2024-03-01T12:00:00Z");

    results[1] = TestResult::failed(TestCaseId::new("OB-301-ACC-100100"), vec!["status".to_string()]);
    assert_eq!(report(&plan, &results).status, ReportStatus::Error);
    assert_eq!(report(&plan, &[]).status, ReportStatus::Pending);
}

#[test]
fn production_report_requires_agreed_terms() {
    let plan = fixture_plan(&ValidatorMap::new());
    let production = certified_by(Environment::Production, false);
    let err = build_report(&plan, &fixture_discovery(), &all_passing(&plan), production, &ReportConfig::default(), NOW)
        .unwrap_err();
    assert!(matches!(err, RunnerError::Report(message) if message.contains("agreedTermsConditions")));
}

#[test]
fn exported_report_imports_unchanged() {
    let plan = fixture_plan(&ValidatorMap::new());
    let built = report(&plan, &all_passing(&plan));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.zip");
    export_report_file(&built, &path).unwrap();
    assert_eq!(import_report_file(&path).unwrap(), built);
}

// ============================================================================
// SECTION: Signing
// ============================================================================

#[test]
fn signed_report_verifies_with_configured_claims() {
    let plan = fixture_plan(&ValidatorMap::new());
    let built = report(&plan, &all_passing(&plan));
    let config = ReportConfig::default();
    let token = sign_report(&built, &plan, &config, &signer(), NOW).unwrap();

    let claims = verify_report(&token, &built, &plan, &verifier(), NOW + Duration::hours(1)).unwrap();
    assert_eq!(claims.iss, config.issuer);
    assert_eq!(claims.sub, config.subject);
    assert_eq!(claims.jti, built.id);
    assert_eq!(claims.exp - claims.nbf, Duration::days(60).whole_seconds());
}

#[test]
fn tampered_report_fails_verification() {
    let plan = fixture_plan(&ValidatorMap::new());
    let built = report(&plan, &all_passing(&plan));
    let token = sign_report(&built, &plan, &ReportConfig::default(), &signer(), NOW).unwrap();

    let mut tampered = built;
    tampered.status = ReportStatus::Error;
    let err = verify_report(&token, &tampered, &plan, &verifier(), NOW).unwrap_err();
    assert_eq!(err, RunnerError::Report("report digest mismatch".to_string()));
}

#[test]
fn different_manifests_fail_verification() {
    let plan = fixture_plan(&ValidatorMap::new());
    let built = report(&plan, &all_passing(&plan));
    let token = sign_report(&built, &plan, &ReportConfig::default(), &signer(), NOW).unwrap();

    let err = verify_report(&token, &built, &TestPlan::default(), &verifier(), NOW).unwrap_err();
    assert_eq!(err, RunnerError::Report("manifest digest mismatch".to_string()));
}

#[test]
fn expired_token_fails_verification() {
    let plan = fixture_plan(&ValidatorMap::new());
    let built = report(&plan, &all_passing(&plan));
    let token = sign_report(&built, &plan, &ReportConfig::default(), &signer(), NOW).unwrap();

    let err = verify_report(&token, &built, &plan, &verifier(), NOW + Duration::days(61)).unwrap_err();
    assert_eq!(err, RunnerError::Report("token expired".to_string()));
}
