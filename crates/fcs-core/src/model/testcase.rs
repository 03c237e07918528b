// crates/fcs-core/src/model/testcase.rs
// ============================================================================
// Module: Test Cases
// Description: Fully resolved, runnable test cases.
// Purpose: Carry the compiled request, expectations and validator handle.
// Dependencies: crate::model::{context, expect, http, identifiers}, serde
// ============================================================================

//! ## Overview
//! A [`TestCase`] is produced by the compiler from a script and lives until
//! the report is written. It carries its own cloned expectations and a shared
//! handle to the response validator for its specification. Context tokens in
//! the request are replaced twice: leniently at compile time and strictly by
//! the runner immediately before execution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::Validator;
use crate::model::context::Context;
use crate::model::context::ContextError;
use crate::model::context::SubstitutionMode;
use crate::model::expect::Expect;
use crate::model::http::HttpResponse;
use crate::model::identifiers::TestCaseId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Interaction-id value replaced with a fresh UUID on every run.
pub const INTERACTION_ID_PLACEHOLDER: &str = "c770aef3-6784-41f7-8e0e-ff5f97bddb3a";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request half of a test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    /// Upper-case HTTP method.
    pub method: String,
    /// Endpoint URI, possibly still containing `$name` tokens.
    pub endpoint: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Headers the runner strips before sending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_headers: Vec<String>,
    /// JWS claims the runner strips before signing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_claims: Vec<String>,
    /// Request body.
    #[serde(rename = "bodyData", default, skip_serializing_if = "String::is_empty")]
    pub request_body: String,
    /// Query parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query_parameters: BTreeMap<String, String>,
    /// Request must carry a detached JWS signature.
    #[serde(default)]
    pub jws_sig: bool,
    /// Request must carry an idempotency key.
    #[serde(default)]
    pub idempotency_key: bool,
}

/// Concrete runnable test case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Test-case identifier.
    #[serde(rename = "@id")]
    pub id: TestCaseId,
    /// Test-case name.
    pub name: String,
    /// Purpose text.
    #[serde(default)]
    pub purpose: String,
    /// Detail text.
    #[serde(default)]
    pub detail: String,
    /// Reference URI.
    #[serde(rename = "refURI", default)]
    pub ref_uri: String,
    /// API specification name.
    #[serde(default)]
    pub api_name: String,
    /// API specification version.
    #[serde(default)]
    pub api_version: String,
    /// Request description.
    pub input: Input,
    /// Expected response.
    pub expect: Expect,
    /// Alternative expectations; any one passing is sufficient.
    #[serde(rename = "expect_one_of", default, skip_serializing_if = "Vec::is_empty")]
    pub expect_one_of: Vec<Expect>,
    /// Context values attached at compile time.
    #[serde(default)]
    pub context: Context,
    /// Request uses the client-credentials token.
    #[serde(default)]
    pub use_client_credentials: bool,
    /// Response signature must be validated.
    #[serde(default)]
    pub validate_signature: bool,
    /// Response validator for the owning specification.
    #[serde(skip)]
    pub validator: Option<Arc<dyn Validator>>,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

impl TestCase {
    /// Replaces `$name` tokens in headers, endpoint, body and query values.
    ///
    /// Returns the names left unresolved (always empty in strict mode).
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] in strict mode for the first missing value or
    /// when token resolution nests too deeply.
    pub fn apply_context(
        &mut self,
        context: &Context,
        mode: SubstitutionMode,
    ) -> Result<Vec<String>, ContextError> {
        let mut missing = Vec::new();
        for value in self.input.headers.values_mut() {
            substitute_in_place(value, context, mode, &mut missing)?;
        }
        substitute_in_place(&mut self.input.endpoint, context, mode, &mut missing)?;
        substitute_in_place(&mut self.input.request_body, context, mode, &mut missing)?;
        for value in self.input.query_parameters.values_mut() {
            substitute_in_place(value, context, mode, &mut missing)?;
        }
        missing.sort();
        missing.dedup();
        Ok(missing)
    }

    /// Evaluates expectations against a response.
    ///
    /// When alternatives are declared, the test passes if any alternative
    /// passes; otherwise the primary expectation decides.
    #[must_use]
    pub fn evaluate(&self, response: &HttpResponse) -> Vec<String> {
        if self.expect_one_of.is_empty() {
            return self.expect.evaluate(response);
        }
        let mut failures = Vec::new();
        for alternative in &self.expect_one_of {
            let alternative_failures = alternative.evaluate(response);
            if alternative_failures.is_empty() {
                return Vec::new();
            }
            failures.extend(alternative_failures);
        }
        failures
    }

    /// Returns true when the response body must be schema-validated.
    #[must_use]
    pub fn schema_check(&self) -> bool {
        self.expect.schema_validation
    }
}

/// Substitutes one string field in place.
fn substitute_in_place(
    value: &mut String,
    context: &Context,
    mode: SubstitutionMode,
    missing: &mut Vec<String>,
) -> Result<(), ContextError> {
    if !value.contains('$') {
        return Ok(());
    }
    let substitution = context.substitute(value, mode)?;
    *value = substitution.text;
    missing.extend(substitution.missing);
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
