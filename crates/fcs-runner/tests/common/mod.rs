// crates/fcs-runner/tests/common/mod.rs
// ============================================================================
// Module: Runner Test Helpers
// Description: Shared fixtures for fcs-runner integration tests.
// Purpose: Build journeys, plans and responses against the fixture tree.
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;

use fcs_core::Context;
use fcs_core::DiscoveryModel;
use fcs_core::EventSink;
use fcs_core::Headers;
use fcs_core::HttpResponse;
use fcs_core::MacroTable;
use fcs_core::ManifestSource;
use fcs_core::MemoryEventSink;
use fcs_core::TestCase;
use fcs_core::load_discovery;
use fcs_runner::Journey;
use fcs_runner::TestPlan;
use fcs_runner::ValidatorMap;
use fcs_schema::load_validator_file;
use time::macros::datetime;

/// Schema URL of the fixture accounts specification.
pub const ACCOUNTS_SCHEMA_URL: &str =
    "https://raw.githubusercontent.com/OpenBankingUK/read-write-api-specs/v3.1.8/dist/swagger/account-info-swagger.json";

/// Returns the fixture directory.
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Returns a manifest source rooted at the fixture directory.
pub fn fixture_source() -> ManifestSource {
    ManifestSource::new(fixture_root())
}

/// Loads the fixture discovery document.
pub fn fixture_discovery() -> DiscoveryModel {
    load_discovery(&fixture_source(), "discovery.json").expect("fixture discovery loads")
}

/// Returns the journey seed context.
pub fn seed_context() -> Context {
    let mut context = Context::new();
    context.put_string("x-fapi-financial-id", "0015800001041RHAAY");
    context.put_string("x-fapi-customer-ip-address", "10.0.0.1");
    context
}

/// Returns a journey over the fixtures with a pinned clock.
pub fn journey(sink: Arc<MemoryEventSink>) -> Journey {
    let events: Arc<dyn EventSink> = sink;
    Journey::new(fixture_source(), events, MacroTable::new(datetime!(2024-03-01 10:30:00 UTC)))
}

/// Returns validators for the accounts specification.
pub fn accounts_validators() -> ValidatorMap {
    let path = fixture_root().join("schemas").join("account-info-swagger.json");
    let mut validators = ValidatorMap::new();
    validators.insert(ACCOUNTS_SCHEMA_URL.to_string(), load_validator_file(&path).expect("fixture schema loads"));
    validators
}

/// Plans the fixture discovery document.
pub fn fixture_plan(validators: &ValidatorMap) -> TestPlan {
    let sink = Arc::new(MemoryEventSink::new());
    journey(sink).plan(&fixture_discovery(), &seed_context(), validators).expect("fixture plan compiles")
}

/// Finds a planned test case.
pub fn planned<'a>(plan: &'a TestPlan, id: &str) -> &'a TestCase {
    plan.test_case(id).expect("planned test case")
}

/// Builds a JSON response.
pub fn json_response(method: &str, path: &str, status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        method: method.to_string(),
        path: path.to_string(),
        status,
        headers: Headers::new().with("Content-Type", "application/json; charset=utf-8"),
        body: body.as_bytes().to_vec(),
    }
}
