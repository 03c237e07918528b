// crates/fcs-core/src/model/results.rs
// ============================================================================
// Module: Test Results
// Description: Outcome of executing one compiled test case.
// Purpose: Shared result record for the result stream, output and reports.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`TestResult`] is produced once per executed test case and never
//! mutated afterwards. Failure reasons are kept in evaluation order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::model::identifiers::TestCaseId;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Pass/fail record for a single test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test-case identifier.
    pub id: TestCaseId,
    /// True when every expectation held.
    pub pass: bool,
    /// Endpoint exercised.
    #[serde(default)]
    pub endpoint: String,
    /// API specification name.
    #[serde(rename = "api-name", default)]
    pub api_name: String,
    /// API specification version.
    #[serde(rename = "api-version", default)]
    pub api_version: String,
    /// Human-readable detail copied from the script.
    #[serde(default)]
    pub detail: String,
    /// Reference URI copied from the script.
    #[serde(rename = "refURI", default)]
    pub ref_uri: String,
    /// Failure reasons; empty when `pass` is true.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fail: Vec<String>,
}

impl TestResult {
    /// Returns a passing result for `id`.
    #[must_use]
    pub fn passed(id: TestCaseId) -> Self {
        Self {
            id,
            pass: true,
            endpoint: String::new(),
            api_name: String::new(),
            api_version: String::new(),
            detail: String::new(),
            ref_uri: String::new(),
            fail: Vec::new(),
        }
    }

    /// Returns a failing result for `id` with the given reasons.
    #[must_use]
    pub fn failed(id: TestCaseId, reasons: Vec<String>) -> Self {
        Self {
            pass: false,
            fail: reasons,
            ..Self::passed(id)
        }
    }
}
