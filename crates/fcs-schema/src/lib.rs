// crates/fcs-schema/src/lib.rs
// ============================================================================
// Module: Conformance Suite Schema Library
// Description: OpenAPI 2.0 and 3.x response validators.
// Purpose: Provide `Validator` implementations selected by document version.
// Dependencies: fcs-core, jsonschema, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! [`load_validator`] decodes an OpenAPI document (JSON or YAML) and returns
//! the front-end matching its declared version behind the shared
//! [`fcs_core::Validator`] capability set. Validation findings are collected,
//! never raised; only structural impossibilities such as an unknown operation
//! surface as errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod document;
pub mod media;
pub mod openapi3;
pub mod paths;
pub mod schema;
pub mod swagger;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::sync::Arc;

use fcs_core::Validator;
use fcs_core::ValidatorError;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use document::DocumentVersion;
pub use document::SpecDocument;
pub use media::MediaType;
pub use openapi3::OpenApi3Validator;
pub use paths::PathIndex;
pub use schema::BodySchema;
pub use swagger::SwaggerValidator;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted document size in bytes.
pub const MAX_DOCUMENT_BYTES: u64 = 32 * 1024 * 1024;

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Builds the validator matching the document's declared version.
///
/// # Errors
///
/// Returns [`ValidatorError::Decode`] for undecodable bytes,
/// [`ValidatorError::UnsupportedSchemaVersion`] for unknown versions and
/// [`ValidatorError::InvalidSchema`] for unusable paths.
pub fn load_validator(bytes: &[u8]) -> Result<Arc<dyn Validator>, ValidatorError> {
    let document = SpecDocument::from_slice(bytes)?;
    let validator: Arc<dyn Validator> = match document.version() {
        DocumentVersion::Swagger2 => Arc::new(SwaggerValidator::new(document)?),
        DocumentVersion::OpenApi3 => Arc::new(OpenApi3Validator::new(document)?),
    };
    Ok(validator)
}

/// Reads a document from disk and builds its validator.
///
/// # Errors
///
/// Returns [`ValidatorError::Decode`] when the file cannot be read or exceeds
/// [`MAX_DOCUMENT_BYTES`], and [`load_validator`] errors otherwise.
pub fn load_validator_file(path: &Path) -> Result<Arc<dyn Validator>, ValidatorError> {
    let metadata = fs::metadata(path).map_err(|err| ValidatorError::Decode(format!("{}: {err}", path.display())))?;
    if metadata.len() > MAX_DOCUMENT_BYTES {
        return Err(ValidatorError::Decode(format!(
            "{}: document exceeds {MAX_DOCUMENT_BYTES} bytes",
            path.display()
        )));
    }
    let bytes = fs::read(path).map_err(|err| ValidatorError::Decode(format!("{}: {err}", path.display())))?;
    load_validator(&bytes)
}
