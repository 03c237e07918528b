// crates/fcs-schema/src/media.rs
// ============================================================================
// Module: Media Types
// Description: Parsing and comparison of Content-Type values.
// Purpose: Compare declared and observed media types without formatting noise.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A media type is a `type/subtype` essence plus parameters. Essences and
//! parameter names compare case-insensitively; parameter values are trimmed
//! and unquoted. An observed type satisfies a declared one when the essences
//! match and every declared parameter is present with the same value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// SECTION: Media Type
// ============================================================================

/// Parsed media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// Lower-case `type/subtype`.
    essence: String,
    /// Lower-case parameter names to normalised values.
    params: BTreeMap<String, String>,
}

impl MediaType {
    /// Parses a header value such as `application/json; charset="UTF-8"`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let params = parts
            .filter_map(|part| part.split_once('='))
            .map(|(name, value)| {
                let value = value.trim().trim_matches('"').trim();
                (name.trim().to_ascii_lowercase(), value.to_ascii_lowercase())
            })
            .collect();
        Self {
            essence,
            params,
        }
    }

    /// Returns the lower-case essence.
    #[must_use]
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Returns true when the essence denotes a JSON payload.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.essence.ends_with("/json") || self.essence.ends_with("+json")
    }

    /// Returns true when `self` (observed) satisfies `declared`.
    #[must_use]
    pub fn satisfies(&self, declared: &Self) -> bool {
        self.essence == declared.essence
            && declared.params.iter().all(|(name, value)| self.params.get(name) == Some(value))
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.params {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_are_normalised() {
        let observed = MediaType::parse("Application/JSON ; Charset = \"UTF-8\"");
        assert_eq!(observed.to_string(), "application/json;charset=utf-8");
    }

    #[test]
    fn extra_observed_parameters_are_allowed() {
        let declared = MediaType::parse("application/json");
        assert!(MediaType::parse("application/json;charset=utf-8").satisfies(&declared));
        assert!(!MediaType::parse("text/html").satisfies(&declared));
    }

    #[test]
    fn declared_parameters_must_be_present() {
        let declared = MediaType::parse("application/json; charset=utf-8");
        assert!(!MediaType::parse("application/json").satisfies(&declared));
        assert!(MediaType::parse("application/json;charset=UTF-8").satisfies(&declared));
    }

    #[test]
    fn jose_payloads_are_not_json() {
        assert!(MediaType::parse("application/problem+json").is_json());
        assert!(!MediaType::parse("application/jose").is_json());
    }
}
