// crates/fcs-core/src/model/discovery.rs
// ============================================================================
// Module: Discovery Model
// Description: Operator-supplied description of the endpoints a bank implements.
// Purpose: Provide typed discovery documents with fail-closed validation.
// Dependencies: crate::model::context, serde, thiserror
// ============================================================================

//! ## Overview
//! A discovery document lists, per API specification, the endpoints an
//! implementation supports together with resource identifiers and base URLs.
//! Discovery inputs are untrusted and are validated before compilation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::model::context::Context;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HTTP methods accepted in discovery endpoint declarations.
const ALLOWED_METHODS: [&str; 6] = ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE"];

/// Context key holding the resource server base URI.
pub const RESOURCE_SERVER_KEY: &str = "resource_server";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Top-level discovery file wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    /// Discovery model payload.
    pub discovery_model: DiscoveryModel,
}

/// Discovery model describing an implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryModel {
    /// Human-readable discovery name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Discovery format version.
    #[serde(default)]
    pub discovery_version: String,
    /// Token acquisition method (for example `psu` or `headless`).
    #[serde(default)]
    pub token_acquisition: String,
    /// One entry per API specification implemented.
    pub discovery_items: Vec<DiscoveryItem>,
}

/// Discovery entry for a single API specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryItem {
    /// API specification metadata.
    pub api_specification: ApiSpecification,
    /// OIDC well-known configuration URI.
    #[serde(default)]
    pub openid_configuration_uri: String,
    /// Base URI for resource server calls.
    #[serde(default)]
    pub resource_base_uri: String,
    /// Identifier overrides seeded into the journey context.
    #[serde(default)]
    pub resource_ids: BTreeMap<String, String>,
    /// Endpoints the implementation supports.
    pub endpoints: Vec<Endpoint>,
}

impl DiscoveryItem {
    /// Seeds resource identifiers and the resource server URI into `context`.
    pub fn seed_context(&self, context: &mut Context) {
        for (key, value) in &self.resource_ids {
            context.put_string(key.clone(), value.clone());
        }
        if !self.resource_base_uri.is_empty() {
            context.put_string(RESOURCE_SERVER_KEY, self.resource_base_uri.clone());
        }
    }
}

/// API specification metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpecification {
    /// Specification name.
    pub name: String,
    /// Schema document URL.
    pub url: String,
    /// Specification version.
    pub version: String,
    /// Schema version URL.
    #[serde(default)]
    pub schema_version: String,
    /// Manifest URI (`file://` only).
    #[serde(default)]
    pub manifest: String,
}

impl ApiSpecification {
    /// Returns the URL identifying the OpenAPI document.
    ///
    /// The schema version URL names the document itself; the specification
    /// URL is used when no schema version is declared.
    #[must_use]
    pub fn schema_url(&self) -> &str {
        if self.schema_version.trim().is_empty() { &self.url } else { &self.schema_version }
    }
}

/// Endpoint declared in a discovery item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// HTTP method.
    pub method: String,
    /// Path template using `{Name}` placeholders.
    pub path: String,
    /// Request-body properties to inject for this endpoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_properties: Vec<ConditionalProperty>,
}

/// Conditional request-body property declared by the implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalProperty {
    /// Schema name hint for the property.
    #[serde(default)]
    pub schema: String,
    /// Property name.
    pub name: String,
    /// Dotted JSON path of the property inside the request body.
    pub path: String,
    /// Value to inject.
    #[serde(default)]
    pub value: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Discovery loading and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Discovery file could not be read.
    #[error("discovery io error: {0}")]
    Io(String),
    /// Discovery file is not valid JSON for the model.
    #[error("discovery decode error: {0}")]
    Decode(String),
    /// Discovery content violated a structural rule.
    #[error("invalid discovery: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Validation
// ============================================================================

impl DiscoveryModel {
    /// Validates discovery structure.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), DiscoveryError> {
        if self.discovery_items.is_empty() {
            return Err(DiscoveryError::Invalid("discoveryItems must be non-empty".to_string()));
        }
        for (index, item) in self.discovery_items.iter().enumerate() {
            let spec = &item.api_specification;
            if spec.name.trim().is_empty() {
                return Err(DiscoveryError::Invalid(format!(
                    "discoveryItems[{index}].apiSpecification.name must be non-empty"
                )));
            }
            if spec.url.trim().is_empty() {
                return Err(DiscoveryError::Invalid(format!(
                    "discoveryItems[{index}].apiSpecification.url must be non-empty"
                )));
            }
            if item.resource_base_uri.trim().is_empty() {
                return Err(DiscoveryError::Invalid(format!(
                    "discoveryItems[{index}].resourceBaseUri must be non-empty"
                )));
            }
            for endpoint in &item.endpoints {
                let method = endpoint.method.to_ascii_uppercase();
                if !ALLOWED_METHODS.contains(&method.as_str()) {
                    return Err(DiscoveryError::Invalid(format!(
                        "discoveryItems[{index}] endpoint {} has unsupported method {}",
                        endpoint.path, endpoint.method
                    )));
                }
                if !endpoint.path.starts_with('/') {
                    return Err(DiscoveryError::Invalid(format!(
                        "discoveryItems[{index}] endpoint path {} must start with /",
                        endpoint.path
                    )));
                }
            }
        }
        Ok(())
    }
}
