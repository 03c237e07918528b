// crates/fcs-schema/src/openapi3.rs
// ============================================================================
// Module: OpenAPI 3 Validator
// Description: Response, request and property validation for OpenAPI 3 documents.
// Purpose: Route exchanges to operations and check them in one pass.
// Dependencies: fcs-core, serde_json
// ============================================================================

//! ## Overview
//! Responses are routed to their operation, then the response object is
//! chosen by exact status, then `NXX` range, then `default`. The observed
//! content type must match one of the declared media types; an undeclared
//! type is reported and the body is still checked against the first JSON
//! media type. JSON bodies are validated against the schema with every
//! finding reported. Request bodies stop at the first finding.
//!
//! Property lookup walks the request-body schema depth first, following local
//! references and composition keywords, and reports the JSON type of the
//! property at a dotted path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use fcs_core::Failure;
use fcs_core::HttpRequest;
use fcs_core::HttpResponse;
use fcs_core::PropertyKind;
use fcs_core::Validator;
use fcs_core::ValidatorError;
use serde_json::Map;
use serde_json::Value;

use crate::document::DocumentVersion;
use crate::document::MAX_REF_DEPTH;
use crate::document::SpecDocument;
use crate::media::MediaType;
use crate::paths::PathIndex;
use crate::schema::BodySchema;
use crate::swagger::NO_CONTENT;
use crate::swagger::body_findings;
use crate::swagger::missing_schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Composition keywords searched during property lookup.
const COMPOSITION_KEYWORDS: [&str; 3] = ["allOf", "oneOf", "anyOf"];

/// Maximum schema nesting followed during property lookup.
const MAX_PROPERTY_DEPTH: usize = 4 * MAX_REF_DEPTH;

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validator over an OpenAPI 3 document.
#[derive(Debug)]
pub struct OpenApi3Validator {
    /// Loaded document.
    document: SpecDocument,
    /// Operation index.
    index: PathIndex,
}

impl OpenApi3Validator {
    /// Builds a validator for an OpenAPI 3 document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::UnsupportedSchemaVersion`] for other versions
    /// and [`ValidatorError::InvalidSchema`] for unusable paths.
    pub fn new(document: SpecDocument) -> Result<Self, ValidatorError> {
        if document.version() != DocumentVersion::OpenApi3 {
            return Err(ValidatorError::UnsupportedSchemaVersion("expected openapi 3".to_string()));
        }
        let index = PathIndex::build(&document)?;
        Ok(Self {
            document,
            index,
        })
    }

    /// Returns the request-body content map of an operation.
    fn request_content<'a>(&'a self, operation: &'a Value) -> Option<&'a Map<String, Value>> {
        operation
            .get("requestBody")
            .map(|body| self.document.resolve(body))
            .and_then(|body| body.get("content"))
            .and_then(Value::as_object)
    }
}

impl Validator for OpenApi3Validator {
    fn validate(&self, response: &HttpResponse) -> Result<Vec<Failure>, ValidatorError> {
        let operation = self.index.lookup(&response.method, &response.path)?;
        let Some(declared) = response_object(operation.object, response.status) else {
            return Ok(vec![Failure::new(format!("server Status {} not defined by the spec", response.status))]);
        };
        let declared = self.document.resolve(declared);
        let content = declared.get("content").and_then(Value::as_object).filter(|content| !content.is_empty());
        let Some(content) = content else {
            if response.status == NO_CONTENT {
                return Ok(Vec::new());
            }
            return Ok(vec![missing_schema(response.status)]);
        };
        let mut failures = Vec::new();
        let observed = response.content_type().map(MediaType::parse);
        let selected = observed.as_ref().and_then(|observed| select_media(content, observed));
        let (media, entry) = match selected {
            Some(selected) => selected,
            None => {
                let declared_types: Vec<&str> = content.keys().map(String::as_str).collect();
                let actual = observed.map_or_else(|| "none".to_string(), |media| media.to_string());
                failures.push(Failure::new(format!(
                    "Content-Type Error: Should produce one of '{}', but got: '{actual}'",
                    declared_types.join(", ")
                )));
                match first_json_media(content) {
                    Some(fallback) => fallback,
                    None => return Ok(failures),
                }
            }
        };
        if response.status == NO_CONTENT || !media.is_json() {
            return Ok(failures);
        }
        match entry.get("schema") {
            Some(schema) => failures.extend(body_findings(&self.document, schema, &response.body)?),
            None => failures.push(missing_schema(response.status)),
        }
        Ok(failures)
    }

    fn validate_request(&self, request: &HttpRequest) -> Result<(), ValidatorError> {
        let operation = self.index.lookup(&request.method, &request.path)?;
        let Some(content) = self.request_content(operation.object) else {
            return Ok(());
        };
        let entry = match request.headers.get("content-type").map(MediaType::parse) {
            Some(observed) => select_media(content, &observed).map(|(_, entry)| entry).ok_or_else(|| {
                ValidatorError::RequestInvalid(format!("request content type {observed} is not declared"))
            })?,
            None => match content.values().next() {
                Some(entry) => entry,
                None => return Ok(()),
            },
        };
        let Some(schema) = entry.get("schema") else {
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
        method: &str,
        path: &str,
        property_path: &str,
    ) -> Result<Option<PropertyKind>, ValidatorError> {
        let operation = self.index.lookup(method, path)?;
        let Some(content) = self.request_content(operation.object) else {
            return Ok(None);
        };
        let target: Vec<&str> = property_path.split('.').filter(|segment| !segment.is_empty()).collect();
        for entry in content.values() {
            if let Some(schema) = entry.get("schema")
                && let Some(kind) = find_property(&self.document, schema, &target, 0)
            {
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }

    fn endpoints(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.index.endpoints()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Selects the response object by exact status, `NXX` range, then `default`.
fn response_object(operation: &Value, status: u16) -> Option<&Value> {
    let responses = operation.get("responses")?;
    let exact = status.to_string();
    let range = format!("{}XX", status / 100);
    responses
        .get(&exact)
        .or_else(|| responses.get(&range))
        .or_else(|| responses.get(range.to_ascii_lowercase()))
        .or_else(|| responses.get("default"))
}

/// Returns the declared media type satisfied by `observed`.
fn select_media<'a>(content: &'a Map<String, Value>, observed: &MediaType) -> Option<(MediaType, &'a Value)> {
    content.iter().find_map(|(declared, entry)| {
        let declared = MediaType::parse(declared);
        (observed.satisfies(&declared) || declared.essence() == "*/*").then_some((declared, entry))
    })
}

/// Returns the first declared JSON media type, used when the observed type is undeclared.
fn first_json_media(content: &Map<String, Value>) -> Option<(MediaType, &Value)> {
    content.iter().map(|(declared, entry)| (MediaType::parse(declared), entry)).find(|(media, _)| media.is_json())
}

/// Depth-first search for the property at `target` beneath `schema`.
fn find_property(document: &SpecDocument, schema: &Value, target: &[&str], depth: usize) -> Option<PropertyKind> {
    if depth > MAX_PROPERTY_DEPTH {
        return None;
    }
    let schema = document.resolve(schema);
    let Some((head, rest)) = target.split_first() else {
        return schema_kind(document, schema, depth);
    };
    if let Some(property) = schema.get("properties").and_then(|properties| properties.get(*head))
        && let Some(kind) = find_property(document, property, rest, depth + 1)
    {
        return Some(kind);
    }
    for keyword in COMPOSITION_KEYWORDS {
        let branches = schema.get(keyword).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
        for branch in branches {
            if let Some(kind) = find_property(document, branch, target, depth + 1) {
                return Some(kind);
            }
        }
    }
    None
}

/// Returns the JSON type of a resolved schema.
fn schema_kind(document: &SpecDocument, schema: &Value, depth: usize) -> Option<PropertyKind> {
    if depth > MAX_PROPERTY_DEPTH {
        return None;
    }
    if let Some(kind) = schema.get("type").and_then(Value::as_str) {
        return PropertyKind::from_schema_type(kind);
    }
    if schema.get("properties").is_some() {
        return Some(PropertyKind::Object);
    }
    COMPOSITION_KEYWORDS
        .iter()
        .filter_map(|keyword| schema.get(*keyword).and_then(Value::as_array))
        .flatten()
        .find_map(|branch| schema_kind(document, document.resolve(branch), depth + 1))
}
