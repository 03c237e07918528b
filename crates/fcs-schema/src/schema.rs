// crates/fcs-schema/src/schema.rs
// ============================================================================
// Module: Body Schemas
// Description: Compiles OpenAPI schema fragments and formats their findings.
// Purpose: Validate JSON bodies against operation schemas with stable messages.
// Dependencies: fcs-core, jsonschema, serde_json
// ============================================================================

//! ## Overview
//! OpenAPI schema fragments reference shared definitions through local
//! pointers (`#/definitions/...` or `#/components/schemas/...`). A fragment is
//! compiled as `{"allOf": [fragment]}` with the document's definition tables
//! attached at the root, so every local pointer resolves against the same
//! tables the document declares. Schemas use JSON Schema draft 4, the dialect
//! OpenAPI 2.0 and 3.0 are built on.
//!
//! Missing required properties are reported as `<path>.<name> in body is
//! required`; every other finding carries its body location and the engine
//! message.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_core::Failure;
use fcs_core::ValidatorError;
use jsonschema::Draft;
use jsonschema::ValidationError;
use jsonschema::error::ValidationErrorKind;
use serde_json::Map;
use serde_json::Value;

use crate::document::SpecDocument;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Root keys copied next to a compiled fragment.
const DEFINITION_TABLES: [&str; 4] = ["definitions", "components", "parameters", "responses"];

// ============================================================================
// SECTION: Body Schema
// ============================================================================

/// Compiled body schema.
pub struct BodySchema {
    /// Draft 4 validator.
    validator: jsonschema::Validator,
}

impl BodySchema {
    /// Compiles `fragment` in the context of `document`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError::InvalidSchema`] when the fragment is rejected.
    pub fn compile(document: &SpecDocument, fragment: &Value) -> Result<Self, ValidatorError> {
        let mut root = Map::new();
        for table in DEFINITION_TABLES {
            if let Some(value) = document.root().get(table) {
                root.insert(table.to_string(), value.clone());
            }
        }
        root.insert("allOf".to_string(), Value::Array(vec![fragment.clone()]));
        let validator = jsonschema::options()
            .with_draft(Draft::Draft4)
            .build(&Value::Object(root))
            .map_err(|err| ValidatorError::InvalidSchema(err.to_string()))?;
        Ok(Self {
            validator,
        })
    }

    /// Returns every finding for `instance`.
    #[must_use]
    pub fn findings(&self, instance: &Value) -> Vec<Failure> {
        self.validator.iter_errors(instance).map(|error| Failure::new(describe(&error))).collect()
    }

    /// Returns the first finding for `instance`, if any.
    #[must_use]
    pub fn first_finding(&self, instance: &Value) -> Option<Failure> {
        self.validator.iter_errors(instance).next().map(|error| Failure::new(describe(&error)))
    }
}

/// Formats one engine finding.
fn describe(error: &ValidationError<'_>) -> String {
    let location = dotted(&error.instance_path.to_string());
    match &error.kind {
        ValidationErrorKind::Required {
            property,
        } => {
            let name = property.as_str().map_or_else(|| property.to_string(), str::to_string);
            format!("{location}.{name} in body is required")
        }
        _ if location.is_empty() => format!("body: {error}"),
        _ => format!("{} in body: {error}", &location[1 ..]),
    }
}

/// Converts a JSON pointer into `.a.b.0` notation.
fn dotted(pointer: &str) -> String {
    pointer
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!(".{}", segment.replace("~1", "/").replace("~0", "~")))
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use serde_json::json;

    use super::*;

    fn document() -> SpecDocument {
        SpecDocument::from_value(json!({
            "swagger": "2.0",
            "definitions": {
                "Balance": {
                    "type": "object",
                    "required": ["Amount"],
                    "properties": {"Amount": {"type": "string"}}
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn definitions_resolve_through_local_pointers() {
        let schema = BodySchema::compile(&document(), &json!({"$ref": "#/definitions/Balance"})).unwrap();
        assert!(schema.findings(&json!({"Amount": "1.00"})).is_empty());
        let findings = schema.findings(&json!({}));
        assert_eq!(findings, vec![Failure::new(".Amount in body is required")]);
    }

    #[test]
    fn nested_findings_carry_their_location() {
        let fragment = json!({
            "type": "object",
            "properties": {"Data": {"type": "object", "properties": {"Balance": {"$ref": "#/definitions/Balance"}}}}
        });
        let schema = BodySchema::compile(&document(), &fragment).unwrap();
        let findings = schema.findings(&json!({"Data": {"Balance": {"Amount": 5}}}));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Data.Balance.Amount in body:"));
        let findings = schema.findings(&json!({"Data": {"Balance": {}}}));
        assert_eq!(findings, vec![Failure::new(".Data.Balance.Amount in body is required")]);
    }

    #[test]
    fn pointer_escapes_are_decoded() {
        assert_eq!(dotted("/a~1b/c~0d/0"), ".a/b.c~d.0");
        assert_eq!(dotted(""), "");
    }
}
