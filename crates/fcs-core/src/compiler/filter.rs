// crates/fcs-core/src/compiler/filter.rs
// ============================================================================
// Module: Endpoint Filter
// Description: Selects scripts whose URIs match endpoints a bank declares.
// Purpose: Normalise discovery paths and manifest URIs via family regex tables.
// Dependencies: crate::model::{discovery, script, spec_type}, regex
// ============================================================================

//! ## Overview
//! Discovery paths use `{AccountId}` templates while manifest URIs use
//! `$accountId` tokens. Both are tested against the canonical regex table of
//! the API family: patterns matched by at least one discovery endpoint are
//! collected, then every script whose stripped URI matches a collected
//! pattern is kept. URIs containing a `foobar` segment are also tested with
//! that segment removed. Output is deduplicated and sorted by script ID, so
//! filtering an already-filtered list is a no-op.

// ============================================================================
// SECTION: Imports
// ============================================================================

use regex::Regex;

use crate::compiler::CompileError;
use crate::model::discovery::Endpoint;
use crate::model::script::Script;
use crate::model::spec_type::SpecType;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Segment reserved by manifests for cross-cutting tests.
const RESERVED_SEGMENT: &str = "/foobar";

// ============================================================================
// SECTION: Endpoint Filter
// ============================================================================

/// Regex-table endpoint filter for one API family.
#[derive(Debug, Clone)]
pub struct EndpointFilter {
    /// API family the table belongs to.
    spec_type: SpecType,
    /// Compiled canonical endpoint patterns.
    patterns: Vec<Regex>,
}

impl EndpointFilter {
    /// Compiles the regex table for `spec_type`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidPattern`] when a table entry does not compile.
    pub fn new(spec_type: SpecType) -> Result<Self, CompileError> {
        let patterns = spec_type
            .endpoint_patterns()
            .iter()
            .map(|pattern| Regex::new(pattern).map_err(|err| CompileError::InvalidPattern(err.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            spec_type,
            patterns,
        })
    }

    /// Returns the API family of this filter.
    #[must_use]
    pub const fn spec_type(&self) -> SpecType {
        self.spec_type
    }

    /// Returns the scripts matching at least one declared endpoint, sorted by ID.
    #[must_use]
    pub fn filter(&self, scripts: &[Script], endpoints: &[Endpoint]) -> Vec<Script> {
        let offered: Vec<&Regex> = self
            .patterns
            .iter()
            .filter(|pattern| endpoints.iter().any(|endpoint| pattern.is_match(&endpoint.path)))
            .collect();
        let mut selected = vec![false; scripts.len()];
        for pattern in offered {
            for (index, script) in scripts.iter().enumerate() {
                if !selected[index] && uri_matches(pattern, &script.uri) {
                    selected[index] = true;
                }
            }
        }
        let mut kept: Vec<Script> = scripts
            .iter()
            .zip(selected)
            .filter_map(|(script, keep)| keep.then(|| script.clone()))
            .collect();
        kept.sort_by(|left, right| left.id.cmp(&right.id));
        kept
    }
}

/// Tests a script URI against a pattern, with the reserved-segment fallback.
fn uri_matches(pattern: &Regex, uri: &str) -> bool {
    let bare = bare_path(uri);
    if pattern.is_match(&bare) {
        return true;
    }
    bare.contains(RESERVED_SEGMENT) && pattern.is_match(&bare.replacen(RESERVED_SEGMENT, "", 1))
}

/// Strips `$` token markers and any query string from a script URI.
fn bare_path(uri: &str) -> String {
    let path = uri.split_once('?').map_or(uri, |(head, _)| head);
    path.replace('$', "")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn bare_path_strips_tokens_and_query() {
        assert_eq!(bare_path("/accounts/$accountId/transactions?fromBookingDateTime=$from"), "/accounts/accountId/transactions");
    }

    #[test]
    fn reserved_segment_is_retried_without_it() {
        let filter = EndpointFilter::new(SpecType::Accounts).unwrap();
        let script = Script {
            id: "x".to_string(),
            uri: "/accounts/foobar".to_string(),
            ..Script::default()
        };
        let endpoints = vec![Endpoint {
            method: "GET".to_string(),
            path: "/accounts".to_string(),
            ..Endpoint::default()
        }];
        assert_eq!(filter.filter(&[script], &endpoints).len(), 1);
    }

    #[test]
    fn undeclared_endpoints_are_dropped() {
        let filter = EndpointFilter::new(SpecType::Accounts).unwrap();
        let script = Script {
            id: "x".to_string(),
            uri: "/accounts/$accountId/balances".to_string(),
            ..Script::default()
        };
        let endpoints = vec![Endpoint {
            method: "GET".to_string(),
            path: "/accounts".to_string(),
            ..Endpoint::default()
        }];
        assert!(filter.filter(&[script], &endpoints).is_empty());
    }
}
