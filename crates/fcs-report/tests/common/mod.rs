// crates/fcs-report/tests/common/mod.rs
// ============================================================================
// Module: Report Test Helpers
// Description: Shared fixtures for fcs-report integration tests.
// Purpose: Build sample reports and locate signing key fixtures.
// ============================================================================

use std::path::PathBuf;

use fcs_core::DiscoveryModel;
use fcs_core::TestCaseId;
use fcs_core::TestResult;
use fcs_report::CertifiedBy;
use fcs_report::Environment;
use fcs_report::Report;
use fcs_report::ReportBuilder;
use fcs_report::SpecificationResults;
use serde_json::json;
use time::OffsetDateTime;
use time::macros::datetime;

/// Fixed clock reading used by every report test.
pub const NOW: OffsetDateTime = datetime!(2024-03-01 10:30:00 UTC);

/// Returns the fixture directory.
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Returns a minimal discovery model with one accounts item.
pub fn discovery() -> DiscoveryModel {
    serde_json::from_value(json!({
        "name": "ob-v3.1-ozone",
        "description": "Ozone model bank",
        "discoveryVersion": "v0.3.0",
        "tokenAcquisition": "psu",
        "discoveryItems": [{
            "apiSpecification": {
                "name": "Account and Transaction API Specification",
                "url": "https://openbankinguk.github.io/read-write-api-site3/v3.1.8/profiles/account-and-transaction-api-profile.html",
                "version": "v3.1.8",
                "schemaVersion": "https://raw.githubusercontent.com/OpenBankingUK/read-write-api-specs/v3.1.8r5/dist/swagger/account-info-swagger.json",
                "manifest": "file://manifests/ob_3.1_accounts_transactions_fca.json"
            },
            "openidConfigurationUri": "https://ob19-auth1-ui.o3bank.co.uk/.well-known/openid-configuration",
            "resourceBaseUri": "https://ob19-rs1.o3bank.co.uk:4501/open-banking/v3.1/aisp",
            "endpoints": [
                {"method": "GET", "path": "/accounts"},
                {"method": "GET", "path": "/accounts/{AccountId}"}
            ]
        }]
    }))
    .unwrap()
}

/// Returns certification details for `environment`.
pub fn certified_by(environment: Environment, agreed: bool) -> CertifiedBy {
    CertifiedBy {
        environment,
        brand: "Ozone Bank".to_string(),
        authorised_by: "A. Tester".to_string(),
        job_title: "Engineer".to_string(),
        agreed_terms_conditions: agreed,
    }
}

/// Returns accounts results with the given pass flags.
pub fn specification(passes: &[bool]) -> SpecificationResults {
    let results = passes
        .iter()
        .enumerate()
        .map(|(index, pass)| {
            let id = TestCaseId::new(format!("OB-301-ACC-{:06}", 100_000 + index * 50));
            if *pass { TestResult::passed(id) } else { TestResult::failed(id, vec!["(status code) 403".to_string()]) }
        })
        .collect();
    SpecificationResults {
        name: "Account and Transaction API Specification".to_string(),
        version: "v3.1.8".to_string(),
        schema_url: "https://raw.githubusercontent.com/OpenBankingUK/read-write-api-specs/v3.1.8r5/dist/swagger/account-info-swagger.json".to_string(),
        results,
    }
}

/// Returns a valid sandbox report with two passing results.
pub fn sample_report() -> Report {
    ReportBuilder::new("v1.6.0", certified_by(Environment::Sandbox, true))
        .build(&discovery(), vec![specification(&[true, true])], NOW)
        .unwrap()
}
