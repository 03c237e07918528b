// crates/fcs-core/src/compiler/conditional.rs
// ============================================================================
// Module: Conditional Properties
// Description: Injects discovery-declared request-body properties.
// Purpose: Populate optional request fields the implementation requires.
// Dependencies: crate::model::{discovery, json_path, path_template}, crate::interfaces
// ============================================================================

//! ## Overview
//! Discovery may declare, per endpoint, request-body properties that an
//! implementation requires. For each compiled test case whose method and
//! endpoint match such a declaration, the property type is looked up through
//! the validator and the value is written into the body: arrays are built by
//! comma-splitting, objects are merged under `path.name` only for the
//! supplementary-data schema, and everything else is written as a string.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::compiler::CompileError;
use crate::events::EventSink;
use crate::events::PipelineEvent;
use crate::interfaces::PropertyKind;
use crate::model::discovery::ConditionalProperty;
use crate::model::discovery::Endpoint;
use crate::model::json_path::set_path;
use crate::model::path_template::PathTemplate;
use crate::model::testcase::TestCase;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Free-form schema whose properties are merged as objects.
pub const SUPPLEMENTARY_DATA_SCHEMA: &str = "OBSupplementaryData1";

/// Event emitted when a declared property cannot be injected.
const CONDITIONAL_PROPERTY_SKIPPED_EVENT: &str = "conditional_property_skipped";

// ============================================================================
// SECTION: Injection
// ============================================================================

/// Injects conditional properties into matching test-case bodies.
///
/// Returns the number of properties written.
///
/// # Errors
///
/// Returns [`CompileError::InvalidPattern`] when a discovery path does not compile.
pub fn inject_conditional_properties(
    test_cases: &mut [TestCase],
    endpoints: &[Endpoint],
    events: &dyn EventSink,
) -> Result<usize, CompileError> {
    let mut injected = 0;
    for endpoint in endpoints.iter().filter(|endpoint| !endpoint.conditional_properties.is_empty()) {
        let template =
            PathTemplate::new(&endpoint.path).map_err(|err| CompileError::InvalidPattern(err.to_string()))?;
        for test_case in test_cases.iter_mut() {
            if test_case.input.method.eq_ignore_ascii_case(&endpoint.method)
                && template.matches(&test_case.input.endpoint)
            {
                injected += inject_into(test_case, &endpoint.conditional_properties, events);
            }
        }
    }
    Ok(injected)
}

/// Injects every property into one test case; returns the number written.
fn inject_into(test_case: &mut TestCase, properties: &[ConditionalProperty], events: &dyn EventSink) -> usize {
    let subject = test_case.id.to_string();
    let Some(validator) = test_case.validator.clone() else {
        events.record(&PipelineEvent::warn(
            CONDITIONAL_PROPERTY_SKIPPED_EVENT,
            subject,
            "no validator available to type conditional properties",
        ));
        return 0;
    };
    let mut body = if test_case.input.request_body.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        match serde_json::from_str::<Value>(&test_case.input.request_body) {
            Ok(body) => body,
            Err(err) => {
                events.record(&PipelineEvent::warn(
                    CONDITIONAL_PROPERTY_SKIPPED_EVENT,
                    subject,
                    format!("request body is not JSON: {err}"),
                ));
                return 0;
            }
        }
    };
    let mut written = 0;
    for property in properties {
        let kind = validator.is_request_property(&test_case.input.method, &test_case.input.endpoint, &property.path);
        match kind {
            Ok(Some(PropertyKind::Array)) => {
                let items: Vec<Value> =
                    property.value.split(',').map(|item| Value::String(item.trim().to_string())).collect();
                set_path(&mut body, &property.path, Value::Array(items));
            }
            Ok(Some(PropertyKind::Object)) if property.schema == SUPPLEMENTARY_DATA_SCHEMA => {
                let path = format!("{}.{}", property.path, property.name);
                set_path(&mut body, &path, Value::String(property.value.clone()));
            }
            Ok(Some(_)) => set_path(&mut body, &property.path, Value::String(property.value.clone())),
            Ok(None) => {
                events.record(&PipelineEvent::warn(
                    CONDITIONAL_PROPERTY_SKIPPED_EVENT,
                    subject.clone(),
                    format!("property {} is not defined by the request schema", property.path),
                ));
                continue;
            }
            Err(err) => {
                events.record(&PipelineEvent::warn(
                    CONDITIONAL_PROPERTY_SKIPPED_EVENT,
                    subject.clone(),
                    format!("property {}: {err}", property.path),
                ));
                continue;
            }
        }
        written += 1;
    }
    if written > 0 {
        test_case.input.request_body = body.to_string();
    }
    written
}
