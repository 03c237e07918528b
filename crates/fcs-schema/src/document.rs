// crates/fcs-schema/src/document.rs
// ============================================================================
// Module: OpenAPI Documents
// Description: Decoding, version detection and local reference resolution.
// Purpose: Give both validator front-ends one view of the loaded document.
// Dependencies: fcs-core, serde_json, serde_yaml
// ============================================================================

//! ## Overview
//! Documents are accepted as JSON or YAML. The declared version decides the
//! front-end: `swagger: "2.0"` selects the Swagger validator and
//! `openapi: 3.x` the OpenAPI 3 validator. Local `$ref` pointers are followed
//! with a bounded depth so reference cycles cannot loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_core::ValidatorError;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum chain of `$ref` hops followed for one value.
pub(crate) const MAX_REF_DEPTH: usize = 16;

/// Operation keys of a path item, in declaration order.
pub(crate) const OPERATION_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

// ============================================================================
// SECTION: Types
// ============================================================================

/// OpenAPI major version declared by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentVersion {
    /// Swagger 2.0.
    Swagger2,
    /// OpenAPI 3.x.
    OpenApi3,
}

/// Decoded OpenAPI document.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    /// Document root.
    root: Value,
    /// Declared version.
    version: DocumentVersion,
}

impl SpecDocument {
    /// Decodes a document from JSON, falling back to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::Decode`] when neither format parses and
    /// [`ValidatorError::UnsupportedSchemaVersion`] for unknown versions.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidatorError> {
        let root = match serde_json::from_slice::<Value>(bytes) {
            Ok(root) => root,
            Err(json_err) => serde_yaml::from_slice::<Value>(bytes)
                .map_err(|yaml_err| ValidatorError::Decode(format!("json: {json_err}; yaml: {yaml_err}")))?,
        };
        Self::from_value(root)
    }

    /// Wraps an already decoded document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::UnsupportedSchemaVersion`] for unknown versions.
    pub fn from_value(root: Value) -> Result<Self, ValidatorError> {
        let version = detect_version(&root)?;
        Ok(Self {
            root,
            version,
        })
    }

    /// Returns the declared version.
    #[must_use]
    pub const fn version(&self) -> DocumentVersion {
        self.version
    }

    /// Returns the document root.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Follows local `$ref` pointers until a non-reference value is reached.
    ///
    /// Unresolvable or remote references are returned unchanged.
    #[must_use]
    pub fn resolve<'a>(&'a self, value: &'a Value) -> &'a Value {
        let mut current = value;
        for _ in 0 .. MAX_REF_DEPTH {
            let Some(target) = current.get("$ref").and_then(Value::as_str).and_then(|reference| self.pointer(reference))
            else {
                return current;
            };
            current = target;
        }
        current
    }

    /// Looks up a `#/...` reference inside the document.
    #[must_use]
    pub fn pointer(&self, reference: &str) -> Option<&Value> {
        reference.strip_prefix('#').and_then(|pointer| self.root.pointer(pointer))
    }

    /// Returns the path prefix every declared path is served under.
    ///
    /// Swagger documents declare `basePath`; OpenAPI 3 documents carry it as
    /// the path component of the first server URL.
    #[must_use]
    pub fn base_path(&self) -> String {
        let raw = match self.version {
            DocumentVersion::Swagger2 => self.root.get("basePath").and_then(Value::as_str).unwrap_or_default(),
            DocumentVersion::OpenApi3 => self
                .root
                .pointer("/servers/0/url")
                .and_then(Value::as_str)
                .map(server_path)
                .unwrap_or_default(),
        };
        raw.trim_end_matches('/').to_string()
    }

    /// Returns declared paths with their path items.
    pub fn paths(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.root.get("paths").and_then(Value::as_object).into_iter().flat_map(|paths| paths.iter())
    }
}

/// Reads the version markers of a document root.
fn detect_version(root: &Value) -> Result<DocumentVersion, ValidatorError> {
    if let Some(swagger) = root.get("swagger") {
        return match swagger.as_str() {
            Some("2.0") => Ok(DocumentVersion::Swagger2),
            _ => Err(ValidatorError::UnsupportedSchemaVersion(format!("swagger {swagger}"))),
        };
    }
    match root.get("openapi").and_then(Value::as_str) {
        Some(version) if version.starts_with("3.") => Ok(DocumentVersion::OpenApi3),
        Some(version) => Err(ValidatorError::UnsupportedSchemaVersion(format!("openapi {version}"))),
        None => Err(ValidatorError::UnsupportedSchemaVersion("no swagger or openapi version declared".to_string())),
    }
}

/// Extracts the path component of a server URL.
fn server_path(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    if url.contains("://") {
        without_scheme.find('/').map_or("", |index| &without_scheme[index ..])
    } else {
        without_scheme
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;

    #[test]
    fn yaml_documents_are_accepted() {
        let document = SpecDocument::from_slice(b"openapi: 3.0.1\npaths: {}\n").unwrap();
        assert_eq!(document.version(), DocumentVersion::OpenApi3);
    }

    #[test]
    fn other_versions_are_rejected() {
        let err = SpecDocument::from_value(json!({"swagger": "1.2"})).unwrap_err();
        assert!(matches!(err, ValidatorError::UnsupportedSchemaVersion(_)));
        let err = SpecDocument::from_value(json!({"openapi": "2.0"})).unwrap_err();
        assert!(matches!(err, ValidatorError::UnsupportedSchemaVersion(_)));
    }

    #[test]
    fn reference_cycles_terminate() {
        let document = SpecDocument::from_value(json!({
            "swagger": "2.0",
            "definitions": {"A": {"$ref": "#/definitions/B"}, "B": {"$ref": "#/definitions/A"}}
        }))
        .unwrap();
        let start = json!({"$ref": "#/definitions/A"});
        assert!(document.resolve(&start).get("$ref").is_some());
    }

    #[test]
    fn base_paths_come_from_either_version() {
        let swagger = SpecDocument::from_value(json!({"swagger": "2.0", "basePath": "/open-banking/v3.1/aisp"})).unwrap();
        assert_eq!(swagger.base_path(), "/open-banking/v3.1/aisp");
        let openapi = SpecDocument::from_value(json!({
            "openapi": "3.0.0",
            "servers": [{"url": "https://rs.example.com/open-banking/v3.1/pisp/"}]
        }))
        .unwrap();
        assert_eq!(openapi.base_path(), "/open-banking/v3.1/pisp");
    }
}
