// crates/fcs-runner/src/evaluate.rs
// ============================================================================
// Module: Test-Case Execution Steps
// Description: Final substitution before a request and evaluation after it.
// Purpose: Turn a compiled test case and its response into a test result.
// Dependencies: fcs-core, uuid
// ============================================================================

//! ## Overview
//! [`prepare`] runs the strict substitution pass that compilation deferred:
//! every `$name` token must now resolve against the test case's own context
//! layered over the journey context, and the interaction-id placeholder gets
//! a fresh UUIDv4. [`evaluate`] checks the response against the expectations,
//! adds schema findings when the test case asks for them, and on success
//! copies context-put values into the journey context for later test cases.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_core::Context;
use fcs_core::EventSink;
use fcs_core::Expect;
use fcs_core::HttpResponse;
use fcs_core::INTERACTION_ID_PLACEHOLDER;
use fcs_core::PipelineEvent;
use fcs_core::SubstitutionMode;
use fcs_core::TestCase;
use fcs_core::TestResult;
use uuid::Uuid;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Event emitted when a schema check cannot run.
pub const SCHEMA_VALIDATION_SKIPPED_EVENT: &str = "schema_validation_skipped";

// ============================================================================
// SECTION: Prepare
// ============================================================================

/// Resolves every remaining context token in a copy of `test_case`.
///
/// # Errors
///
/// Returns [`RunnerError::Compile`] naming the test case when a token is
/// still unresolved or nests too deeply.
pub fn prepare(test_case: &TestCase, context: &Context) -> Result<TestCase, RunnerError> {
    let mut combined = test_case.context.clone();
    combined.layer_over(context);

    let mut prepared = test_case.clone();
    prepared
        .apply_context(&combined, SubstitutionMode::Strict)
        .map_err(|err| RunnerError::Compile(format!("test case {}: {err}", test_case.id)))?;
    for value in prepared.input.headers.values_mut() {
        if value.contains(INTERACTION_ID_PLACEHOLDER) {
            *value = value.replace(INTERACTION_ID_PLACEHOLDER, &Uuid::new_v4().to_string());
        }
    }
    Ok(prepared)
}

// ============================================================================
// SECTION: Evaluate
// ============================================================================

/// Evaluates `response` for `test_case` and records context values on success.
pub fn evaluate(
    test_case: &TestCase,
    response: &HttpResponse,
    context: &mut Context,
    events: &dyn EventSink,
) -> TestResult {
    let mut failures = test_case.evaluate(response);
    if test_case.schema_check() {
        failures.extend(schema_failures(test_case, response, events));
    }
    if failures.is_empty() {
        failures.extend(test_case.expect.put_context(response, context));
        if let Some(alternative) = passing_alternative(test_case, response) {
            failures.extend(alternative.put_context(response, context));
        }
    }

    let mut result = if failures.is_empty() {
        TestResult::passed(test_case.id.clone())
    } else {
        TestResult::failed(test_case.id.clone(), failures)
    };
    result.endpoint.clone_from(&test_case.input.endpoint);
    result.api_name.clone_from(&test_case.api_name);
    result.api_version.clone_from(&test_case.api_version);
    result.detail.clone_from(&test_case.detail);
    result.ref_uri.clone_from(&test_case.ref_uri);
    result
}

/// Runs the attached validator; a missing or failing validator skips the check.
fn schema_failures(test_case: &TestCase, response: &HttpResponse, events: &dyn EventSink) -> Vec<String> {
    let Some(validator) = &test_case.validator else {
        events.record(&PipelineEvent::warn(
            SCHEMA_VALIDATION_SKIPPED_EVENT,
            test_case.id.to_string(),
            "no validator attached",
        ));
        return Vec::new();
    };
    match validator.validate(response) {
        Ok(findings) => findings.into_iter().map(|failure| failure.message).collect(),
        Err(err) => {
            events.record(&PipelineEvent::warn(
                SCHEMA_VALIDATION_SKIPPED_EVENT,
                test_case.id.to_string(),
                err.to_string(),
            ));
            Vec::new()
        }
    }
}

/// Returns the first alternative expectation that accepted the response.
fn passing_alternative<'a>(test_case: &'a TestCase, response: &HttpResponse) -> Option<&'a Expect> {
    test_case.expect_one_of.iter().find(|alternative| alternative.evaluate(response).is_empty())
}
