// crates/fcs-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared fixtures and stubs for fcs-core integration tests.
// Purpose: Locate fixture files and provide a configurable validator stub.
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use fcs_core::Context;
use fcs_core::DiscoveryItem;
use fcs_core::DiscoveryModel;
use fcs_core::Failure;
use fcs_core::HttpRequest;
use fcs_core::HttpResponse;
use fcs_core::MacroTable;
use fcs_core::ManifestSource;
use fcs_core::PropertyKind;
use fcs_core::Validator;
use fcs_core::ValidatorError;
use fcs_core::load_discovery;
use time::macros::datetime;

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

/// Returns the discovery item whose schema URL contains `needle`.
pub fn discovery_item(needle: &str) -> DiscoveryItem {
    fixture_discovery()
        .discovery_items
        .into_iter()
        .find(|item| item.api_specification.schema_url().contains(needle))
        .expect("fixture discovery item")
}

/// Returns a macro table pinned to a fixed instant.
pub fn fixed_macros() -> MacroTable {
    MacroTable::new(datetime!(2024-03-01 10:30:00 UTC))
}

/// Returns a parent context with the journey-wide header values.
pub fn journey_context() -> Context {
    let mut context = Context::new();
    context.put_string("x-fapi-financial-id", "0015800001041RHAAY");
    context.put_string("x-fapi-customer-ip-address", "10.0.0.1");
    context
}

/// Validator stub answering property lookups from a fixed table.
#[derive(Debug, Default)]
pub struct StubValidator {
    /// Property path to kind.
    properties: BTreeMap<String, PropertyKind>,
    /// Paths answering with an error.
    failing: BTreeSet<String>,
}

impl StubValidator {
    /// Creates an empty stub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a property kind.
    pub fn with_property(mut self, path: &str, kind: PropertyKind) -> Self {
        self.properties.insert(path.to_string(), kind);
        self
    }

    /// Declares a property whose lookup fails.
    pub fn with_failure(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Wraps the stub for attachment to test cases.
    pub fn shared(self) -> Arc<dyn Validator> {
        Arc::new(self)
    }
}

impl Validator for StubValidator {
    fn validate(&self, _response: &HttpResponse) -> Result<Vec<Failure>, ValidatorError> {
        Ok(Vec::new())
    }

    fn validate_request(&self, _request: &HttpRequest) -> Result<(), ValidatorError> {
        Ok(())
    }

    fn is_request_property(
        &self,
        _method: &str,
        _path: &str,
        property_path: &str,
    ) -> Result<Option<PropertyKind>, ValidatorError> {
        if self.failing.contains(property_path) {
            return Err(ValidatorError::NotFound(property_path.to_string()));
        }
        Ok(self.properties.get(property_path).copied())
    }

    fn endpoints(&self) -> BTreeMap<String, BTreeSet<String>> {
        BTreeMap::new()
    }
}
