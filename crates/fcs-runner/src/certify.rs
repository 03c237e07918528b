// crates/fcs-runner/src/certify.rs
// ============================================================================
// Module: Report Certification
// Description: Builds, signs and verifies the report of a finished journey.
// Purpose: Bind run results to the discovery model and manifests they came from.
// Dependencies: fcs-config, fcs-core, fcs-report, time
// ============================================================================

//! ## Overview
//! [`build_report`] splits the aggregated results by specification and hands
//! them to the report builder with the configured validity. [`sign_report`]
//! digests the report, the discovery model and the raw manifest bytes of the
//! plan and signs the claims; [`verify_report`] recomputes the same digests
//! and checks a token against them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_config::ReportConfig;
use fcs_core::DiscoveryModel;
use fcs_core::TestResult;
use fcs_report::CertifiedBy;
use fcs_report::Report;
use fcs_report::ReportBuilder;
use fcs_report::ReportClaims;
use fcs_report::ReportDigests;
use fcs_report::ReportSigner;
use fcs_report::ReportVerifier;
use serde_json::Map;
use time::Duration;
use time::OffsetDateTime;

use crate::error::RunnerError;
use crate::journey::TestPlan;
use crate::version::FULL_VERSION;

// ============================================================================
// SECTION: Build
// ============================================================================

/// Builds the validated report for a finished run.
///
/// # Errors
///
/// Returns [`RunnerError::Report`] when the validity is out of range or the
/// report fails validation.
pub fn build_report(
    plan: &TestPlan,
    discovery: &DiscoveryModel,
    results: &[TestResult],
    certified_by: CertifiedBy,
    config: &ReportConfig,
    now: OffsetDateTime,
) -> Result<Report, RunnerError> {
    let builder = ReportBuilder::new(FULL_VERSION, certified_by).with_validity(validity(config)?);
    builder
        .build(discovery, plan.specification_results(results), now)
        .map_err(|err| RunnerError::Report(err.to_string()))
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Signs `report` with the configured issuer, subject and validity.
///
/// # Errors
///
/// Returns [`RunnerError::Report`] when digesting or signing fails.
pub fn sign_report(
    report: &Report,
    plan: &TestPlan,
    config: &ReportConfig,
    signer: &ReportSigner,
    now: OffsetDateTime,
) -> Result<String, RunnerError> {
    let digests = ReportDigests::compute(report, &report.discovery, plan.manifest_bytes())
        .map_err(|err| RunnerError::Report(err.to_string()))?;
    let claims = ReportClaims::new(
        config.issuer.clone(),
        config.subject.clone(),
        report.id.clone(),
        digests,
        now,
        validity(config)?,
    );
    signer.sign(&claims, &Map::new()).map_err(|err| RunnerError::Report(err.to_string()))
}

/// Verifies `token` against `report` and the plan's manifests.
///
/// # Errors
///
/// Returns [`RunnerError::Report`] naming the failed check.
pub fn verify_report(
    token: &str,
    report: &Report,
    plan: &TestPlan,
    verifier: &ReportVerifier,
    now: OffsetDateTime,
) -> Result<ReportClaims, RunnerError> {
    let expected = ReportDigests::compute(report, &report.discovery, plan.manifest_bytes())
        .map_err(|err| RunnerError::Report(err.to_string()))?;
    verifier.verify(token, &expected, now).map_err(|err| RunnerError::Report(err.to_string()))
}

/// Converts the configured validity.
fn validity(config: &ReportConfig) -> Result<Duration, RunnerError> {
    Duration::try_from(config.validity())
        .map_err(|err| RunnerError::Report(format!("report.validity_secs: {err}")))
}
