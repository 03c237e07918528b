// crates/fcs-core/src/interfaces/mod.rs
// ============================================================================
// Module: Conformance Interfaces
// Description: Contract surfaces implemented outside the core.
// Purpose: Define the response-validator capability set used by test cases.
// Dependencies: crate::model::http, thiserror
// ============================================================================

//! ## Overview
//! The core compiles and evaluates test cases but does not parse OpenAPI
//! documents itself. Validators for Swagger 2.0 and OpenAPI 3.0 implement
//! [`Validator`] and are attached to compiled test cases as shared handles.
//!
//! Validation findings are never errors: they accumulate as [`Failure`]s.
//! [`ValidatorError`] is reserved for structural impossibilities.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::model::http::HttpRequest;
use crate::model::http::HttpResponse;

// ============================================================================
// SECTION: Failures
// ============================================================================

/// A single non-fatal validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Human-readable reason.
    pub message: String,
}

impl Failure {
    /// Creates a failure from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// SECTION: Property Kinds
// ============================================================================

/// JSON type of a request-body property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// JSON array.
    Array,
    /// JSON object.
    Object,
    /// JSON string.
    String,
    /// JSON number.
    Number,
    /// JSON integer.
    Integer,
    /// JSON boolean.
    Boolean,
}

impl PropertyKind {
    /// Parses an OpenAPI `type` keyword.
    #[must_use]
    pub fn from_schema_type(kind: &str) -> Option<Self> {
        match kind {
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Returns the bracketed type tag (`[array]`, `[string]`, ...).
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Array => "[array]",
            Self::Object => "[object]",
            Self::String => "[string]",
            Self::Number => "[number]",
            Self::Integer => "[integer]",
            Self::Boolean => "[boolean]",
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Structural validator errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    /// Document declares a version the validator cannot handle.
    #[error("unsupported schema version: {0}")]
    UnsupportedSchemaVersion(String),
    /// Document could not be decoded.
    #[error("schema decode failure: {0}")]
    Decode(String),
    /// No operation matches the method and path.
    #[error("operation not found: {0}")]
    NotFound(String),
    /// Schema fragment could not be compiled.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Capability not offered by this document version.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// Request body violated the request schema.
    #[error("request invalid: {0}")]
    RequestInvalid(String),
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Response and request validator over an OpenAPI document.
pub trait Validator: Send + Sync + fmt::Debug {
    /// Validates a response and returns every finding.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError`] only for structural impossibilities such as
    /// an operation missing from the document.
    fn validate(&self, response: &HttpResponse) -> Result<Vec<Failure>, ValidatorError>;

    /// Validates a request body; stops at the first defect.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::RequestInvalid`] describing the first defect.
    fn validate_request(&self, request: &HttpRequest) -> Result<(), ValidatorError>;

    /// Looks up the type of a request-body property by dotted path.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Unsupported`] for documents without request
    /// schemas and [`ValidatorError::NotFound`] when no operation matches.
    fn is_request_property(
        &self,
        method: &str,
        path: &str,
        property_path: &str,
    ) -> Result<Option<PropertyKind>, ValidatorError>;

    /// Returns every declared path with the set of methods defined on it.
    fn endpoints(&self) -> BTreeMap<String, BTreeSet<String>>;
}
