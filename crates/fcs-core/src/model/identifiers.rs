// crates/fcs-core/src/model/identifiers.rs
// ============================================================================
// Module: Conformance Identifiers
// Description: Opaque identifiers for test cases and access-token groups.
// Purpose: Keep test-case IDs and token names from being mixed with free text.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Test-case identifiers come from manifest scripts (for example `OB-301-ACC-120382`)
//! and token names are minted by the permission aggregator (`Token0001`, ...).
//! Both serialize as plain strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identifier of a compiled test case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCaseId(String);

impl TestCaseId {
    /// Creates a new test-case identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TestCaseId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TestCaseId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Name of an access-token group, also used as its `$name` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenName(String);

impl TokenName {
    /// Creates a new token name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the `$name` placeholder resolved by the runner once acquired.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("${}", self.0)
    }
}

impl fmt::Display for TokenName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TokenName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TokenName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
