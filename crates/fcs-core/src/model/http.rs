// crates/fcs-core/src/model/http.rs
// ============================================================================
// Module: HTTP Exchange Model
// Description: Request and response values presented by the runner.
// Purpose: Give validators and expectations a transport-neutral view of HTTP.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The core never performs HTTP itself. The runner presents the observed
//! request and response using these types. Header names are case-insensitive
//! and stored lower-cased.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Headers
// ============================================================================

/// Case-insensitive header map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Creates an empty header map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any value under the same name.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Returns the header value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Returns true when the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }
}

// ============================================================================
// SECTION: Exchange
// ============================================================================

/// HTTP request as issued by the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Upper-case HTTP method.
    pub method: String,
    /// Request path without scheme or host.
    pub path: String,
    /// Request headers.
    pub headers: Headers,
    /// Raw request body.
    pub body: Vec<u8>,
}

/// HTTP response paired with the request that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Method of the originating request.
    pub method: String,
    /// Path of the originating request.
    pub path: String,
    /// Observed status code.
    pub status: u16,
    /// Response headers.
    pub headers: Headers,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }
}
