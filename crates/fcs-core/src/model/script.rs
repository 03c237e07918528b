// crates/fcs-core/src/model/script.rs
// ============================================================================
// Module: Manifest Scripts and References
// Description: Declarative test recipes and the assertion/data catalogues.
// Purpose: Typed forms of the manifest and reference JSON files.
// Dependencies: crate::model::{expect, hashing}, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Manifest`] is a named, versioned list of [`Script`]s for one API
//! family. Scripts refer to entries of two reference catalogues: assertions
//! (each carrying an [`Expect`]) and body data (each carrying a JSON body
//! template). Scripts are immutable once loaded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::model::expect::Expect;
use crate::model::hashing::HashError;
use crate::model::hashing::canonical_json_string;

// ============================================================================
// SECTION: Scripts
// ============================================================================

/// Declarative recipe for one HTTP call plus expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Script identifier, unique within a manifest.
    pub id: String,
    /// Short description; becomes the test-case name.
    pub description: String,
    /// Longer purpose text.
    pub detail: String,
    /// Reference URI into the specification documentation.
    #[serde(rename = "refURI")]
    pub ref_uri: String,
    /// Semantic version range; empty matches every version.
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// HTTP method.
    pub method: String,
    /// URI template with `$name` tokens.
    pub uri: String,
    /// Parameter map resolved into the local context.
    pub parameters: BTreeMap<String, String>,
    /// Query parameters appended to the request.
    #[serde(rename = "queryParameters")]
    pub query_parameters: BTreeMap<String, String>,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Headers the runner must strip.
    #[serde(rename = "removeHeaders")]
    pub remove_headers: Vec<String>,
    /// JWS claims the runner must strip from the signature.
    #[serde(rename = "removeClaims")]
    pub remove_claims: Vec<String>,
    /// Request body template.
    pub body: String,
    /// Permissions the access token must carry.
    pub permissions: Vec<String>,
    /// Permissions the access token must not carry.
    #[serde(rename = "permissions-excluded")]
    pub permissions_excluded: Vec<String>,
    /// Resource tag.
    pub resource: String,
    /// Assertion references merged into the expectation.
    pub asserts: Vec<String>,
    /// Assertion references accepted as alternatives.
    #[serde(rename = "asserts_one_of")]
    pub asserts_one_of: Vec<String>,
    /// Validate the response body against the OpenAPI schema.
    #[serde(rename = "schemaCheck")]
    pub schema_check: bool,
    /// Use the client-credentials token instead of a consent token.
    #[serde(rename = "useCCGToken")]
    pub use_ccg_token: bool,
    /// Validate the response signature.
    #[serde(rename = "validateSignature")]
    pub validate_signature: bool,
    /// Response value kept in the context after success.
    #[serde(rename = "keepContextOnSuccess", skip_serializing_if = "Option::is_none")]
    pub keep_context_on_success: Option<ContextPutDirective>,
}

/// Name and JSON path of a value persisted after a passing test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextPutDirective {
    /// Context key.
    #[serde(default)]
    pub name: String,
    /// Dotted JSON path into the response body.
    #[serde(default)]
    pub value: String,
}

impl ContextPutDirective {
    /// Returns true when both name and path are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.value.is_empty()
    }
}

/// Named, versioned list of scripts for one API family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest name.
    #[serde(default)]
    pub name: String,
    /// Manifest version.
    #[serde(default)]
    pub version: String,
    /// Scripts in file order.
    pub scripts: Vec<Script>,
}

// ============================================================================
// SECTION: References
// ============================================================================

/// Named entry in the assertions or data catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    /// Assertion expectation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect: Option<Expect>,
    /// Structured body template as loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Canonical string form of the body template.
    #[serde(rename = "bodyData", skip_serializing_if = "String::is_empty")]
    pub body_data: String,
    /// Permissions associated with the reference.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

impl Reference {
    /// Moves a structured body into its canonical string slot.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when the body cannot be canonicalized.
    pub fn canonicalize_body(&mut self) -> Result<(), HashError> {
        match self.body.take() {
            Some(Value::String(text)) => self.body_data = text,
            Some(Value::Null) | None => {}
            Some(structured) => self.body_data = canonical_json_string(&structured)?,
        }
        Ok(())
    }
}

/// One reference catalogue file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceCatalogue {
    /// References keyed by name.
    #[serde(default)]
    pub references: BTreeMap<String, Reference>,
}

/// Merged name to reference lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    /// Merged entries.
    entries: BTreeMap<String, Reference>,
}

impl References {
    /// Merges assertions and data; data wins on name collisions.
    #[must_use]
    pub fn merge(assertions: ReferenceCatalogue, data: ReferenceCatalogue) -> Self {
        let mut entries = assertions.references;
        entries.extend(data.references);
        Self {
            entries,
        }
    }

    /// Returns the reference named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Reference> {
        self.entries.get(name)
    }

    /// Returns the expectation of the assertion named `name`.
    #[must_use]
    pub fn expect(&self, name: &str) -> Option<&Expect> {
        self.entries.get(name).and_then(|reference| reference.expect.as_ref())
    }

    /// Returns the non-empty body data of the reference named `name`.
    #[must_use]
    pub fn body_data(&self, name: &str) -> Option<&str> {
        self.entries
            .get(name)
            .map(|reference| reference.body_data.as_str())
            .filter(|data| !data.is_empty())
    }

    /// Returns the number of merged references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no references are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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
    fn structured_body_moves_to_canonical_body_data() {
        let mut reference = Reference {
            body: Some(json!({"b": 2, "a": 1})),
            ..Reference::default()
        };
        reference.canonicalize_body().unwrap();
        assert_eq!(reference.body, None);
        assert_eq!(reference.body_data, r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn data_catalogue_wins_on_collision() {
        let mut assertions = ReferenceCatalogue::default();
        assertions.references.insert(
            "shared".to_string(),
            Reference {
                expect: Some(Expect::default()),
                ..Reference::default()
            },
        );
        let mut data = ReferenceCatalogue::default();
        data.references.insert(
            "shared".to_string(),
            Reference {
                body_data: "{}".to_string(),
                ..Reference::default()
            },
        );
        let merged = References::merge(assertions, data);
        assert_eq!(merged.len(), 1);
        assert!(merged.expect("shared").is_none());
        assert_eq!(merged.body_data("shared"), Some("{}"));
    }

    #[test]
    fn scripts_parse_manifest_field_names() {
        let script: Script = serde_json::from_value(json!({
            "id": "OB-301-ACC-120382",
            "refURI": "https://example.org/accounts",
            "apiVersion": ">=3.1.0",
            "uri": "/accounts/$accountId",
            "permissions-excluded": ["ReadAccountsDetail"],
            "asserts_one_of": ["OB3GLOAssertOn200"],
            "schemaCheck": true,
            "useCCGToken": false,
            "keepContextOnSuccess": {"name": "accountId", "value": "Data.Account.0.AccountId"}
        }))
        .unwrap();
        assert_eq!(script.ref_uri, "https://example.org/accounts");
        assert_eq!(script.permissions_excluded, vec!["ReadAccountsDetail".to_string()]);
        assert!(script.schema_check);
        assert!(script.keep_context_on_success.unwrap().is_complete());
    }
}
