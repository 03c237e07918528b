// crates/fcs-schema/src/swagger.rs
// ============================================================================
// Module: Swagger 2.0 Validator
// Description: Response validation chain for OpenAPI 2.0 documents.
// Purpose: Check content type, status code and body schema of responses.
// Dependencies: fcs-core, serde_json
// ============================================================================

//! ## Overview
//! A response is routed to its operation and passed through three checks in
//! order, accumulating every finding:
//! 1. content type against `produces` (operation first, then document),
//! 2. status code against the declared responses,
//! 3. body against the response schema, skipped for `204 No Content`.
//!
//! An undeclared status is reported once by the status check; a declared
//! status without a schema is reported by the body check.
//!
//! Request-property lookup needs OpenAPI 3 request bodies and is unsupported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use fcs_core::Failure;
use fcs_core::HttpRequest;
use fcs_core::HttpResponse;
use fcs_core::PropertyKind;
use fcs_core::Validator;
use fcs_core::ValidatorError;
use serde_json::Value;

use crate::document::DocumentVersion;
use crate::document::SpecDocument;
use crate::media::MediaType;
use crate::paths::Operation;
use crate::paths::PathIndex;
use crate::schema::BodySchema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status code whose body is never validated.
pub(crate) const NO_CONTENT: u16 = 204;

// ============================================================================
// SECTION: Response Checks
// ============================================================================

/// One link of the response validation chain.
trait ResponseCheck: Send + Sync {
    /// Appends findings for `response` on `operation`.
    fn check(
        &self,
        document: &SpecDocument,
        operation: Operation<'_>,
        response: &HttpResponse,
        failures: &mut Vec<Failure>,
    ) -> Result<(), ValidatorError>;
}

/// Compares the observed Content-Type with the declared `produces` type.
struct ContentTypeCheck;

impl ResponseCheck for ContentTypeCheck {
    fn check(
        &self,
        document: &SpecDocument,
        operation: Operation<'_>,
        response: &HttpResponse,
        failures: &mut Vec<Failure>,
    ) -> Result<(), ValidatorError> {
        let Some(expected) = first_produces(operation.object).or_else(|| first_produces(document.root())) else {
            return Ok(());
        };
        let declared = MediaType::parse(expected);
        match response.content_type() {
            Some(actual) if MediaType::parse(actual).satisfies(&declared) => {}
            Some(actual) => failures.push(Failure::new(format!(
                "Content-Type Error: Should produce '{declared}', but got: '{}'",
                MediaType::parse(actual)
            ))),
            None => failures.push(Failure::new(format!(
                "Content-Type Error: Should produce '{declared}', but no Content-Type header was returned"
            ))),
        }
        Ok(())
    }
}

/// Requires a response object for the observed status code.
struct StatusCodeCheck;

impl ResponseCheck for StatusCodeCheck {
    fn check(
        &self,
        _document: &SpecDocument,
        operation: Operation<'_>,
        response: &HttpResponse,
        failures: &mut Vec<Failure>,
    ) -> Result<(), ValidatorError> {
        if response_object(operation.object, response.status).is_none() {
            failures.push(Failure::new(format!("server Status {} not defined by the spec", response.status)));
        }
        Ok(())
    }
}

/// Validates the JSON body against the response schema.
struct BodySchemaCheck;

impl ResponseCheck for BodySchemaCheck {
    fn check(
        &self,
        document: &SpecDocument,
        operation: Operation<'_>,
        response: &HttpResponse,
        failures: &mut Vec<Failure>,
    ) -> Result<(), ValidatorError> {
        if response.status == NO_CONTENT {
            return Ok(());
        }
        let Some(declared) = response_object(operation.object, response.status) else {
            return Ok(());
        };
        let Some(schema) = document.resolve(declared).get("schema") else {
            failures.push(missing_schema(response.status));
            return Ok(());
        };
        failures.extend(body_findings(document, schema, &response.body)?);
        Ok(())
    }
}

/// Finding for a declared status code whose response carries no schema.
pub(crate) fn missing_schema(status: u16) -> Failure {
    Failure::new(format!("could't find a schema to validate for status code {status}"))
}

/// Parses `body` as JSON and validates it against `schema`.
///
/// A body that is not JSON yields a single finding.
pub(crate) fn body_findings(
    document: &SpecDocument,
    schema: &Value,
    body: &[u8],
) -> Result<Vec<Failure>, ValidatorError> {
    let instance = match serde_json::from_slice::<Value>(body) {
        Ok(instance) => instance,
        Err(err) => return Ok(vec![Failure::new(format!("response body is not valid JSON: {err}"))]),
    };
    Ok(BodySchema::compile(document, schema)?.findings(&instance))
}

/// Returns the first `produces` entry of a document or operation object.
fn first_produces(object: &Value) -> Option<&str> {
    object.get("produces").and_then(Value::as_array).and_then(|types| types.first()).and_then(Value::as_str)
}

/// Returns the response object declared for `status`.
fn response_object(operation: &Value, status: u16) -> Option<&Value> {
    operation.get("responses").and_then(|responses| responses.get(status.to_string()))
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validator over a Swagger 2.0 document.
pub struct SwaggerValidator {
    /// Loaded document.
    document: SpecDocument,
    /// Operation index.
    index: PathIndex,
    /// Response checks in evaluation order.
    checks: Vec<Box<dyn ResponseCheck>>,
}

impl fmt::Debug for SwaggerValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwaggerValidator").field("paths", &self.index.endpoints().len()).finish_non_exhaustive()
    }
}

impl SwaggerValidator {
    /// Builds a validator for a Swagger 2.0 document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::UnsupportedSchemaVersion`] for other versions
    /// and [`ValidatorError::InvalidSchema`] for unusable paths.
    pub fn new(document: SpecDocument) -> Result<Self, ValidatorError> {
        if document.version() != DocumentVersion::Swagger2 {
            return Err(ValidatorError::UnsupportedSchemaVersion("expected swagger 2.0".to_string()));
        }
        let index = PathIndex::build(&document)?;
        Ok(Self {
            document,
            index,
            checks: vec![Box::new(ContentTypeCheck), Box::new(StatusCodeCheck), Box::new(BodySchemaCheck)],
        })
    }
}

impl Validator for SwaggerValidator {
    fn validate(&self, response: &HttpResponse) -> Result<Vec<Failure>, ValidatorError> {
        let operation = self.index.lookup(&response.method, &response.path)?;
        let mut failures = Vec::new();
        for check in &self.checks {
            check.check(&self.document, operation, response, &mut failures)?;
        }
        Ok(failures)
    }

    fn validate_request(&self, request: &HttpRequest) -> Result<(), ValidatorError> {
        let operation = self.index.lookup(&request.method, &request.path)?;
        let parameters = operation
            .object
            .get("parameters")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .chain(operation.entry.parameters());
        let body_schema = parameters
            .map(|parameter| self.document.resolve(parameter))
            .find(|parameter| parameter.get("in").and_then(Value::as_str) == Some("body"))
            .and_then(|parameter| parameter.get("schema"));
        let Some(schema) = body_schema else {
            return Ok(());
        };
        let instance: Value = serde_json::from_slice(&request.body)
            .map_err(|err| ValidatorError::RequestInvalid(format!("request body is not valid JSON: {err}")))?;
        match BodySchema::compile(&self.document, schema)?.first_finding(&instance) {
            Some(finding) => Err(ValidatorError::RequestInvalid(finding.message)),
            None => Ok(()),
        }
    }

    fn is_request_property(
        &self,
        _method: &str,
        _path: &str,
        _property_path: &str,
    ) -> Result<Option<PropertyKind>, ValidatorError> {
        Err(ValidatorError::Unsupported("request property lookup requires an OpenAPI 3 document".to_string()))
    }

    fn endpoints(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.index.endpoints()
    }
}
