// crates/fcs-core/src/compiler/versions.rs
// ============================================================================
// Module: Version Filtering
// Description: Tolerant version parsing and script version-range filtering.
// Purpose: Keep only scripts whose `apiVersion` range admits the specification version.
// Dependencies: semver
// ============================================================================

//! ## Overview
//! Script `apiVersion` values are range expressions such as `>=3.1.0`,
//! `>= 3.1.2 < 4.0`, `3.1.8` or `3.1.0 || 3.1.2`. Alternatives split on `||`;
//! whitespace-separated comparators are all required; a bare version means an
//! exact match. An API-version list containing `0.0.0` disables filtering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use semver::Version;
use semver::VersionReq;

use crate::compiler::CompileError;
use crate::model::script::Script;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// API version that disables range filtering.
pub const BYPASS_VERSION: &str = "0.0.0";

/// Characters that start a comparator operator.
const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses a version, accepting a `v` prefix and missing minor/patch parts.
///
/// # Errors
///
/// Returns [`semver::Error`] when the padded text is still not a version.
pub fn parse_tolerant(text: &str) -> Result<Version, semver::Error> {
    let text = text.trim();
    let text = text.strip_prefix(['v', 'V']).unwrap_or(text);
    let split = text.find(['-', '+']).unwrap_or(text.len());
    let (core, suffix) = text.split_at(split);
    let mut padded = core.to_string();
    for _ in core.split('.').count() .. 3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded)
}

/// Parses a range expression into alternatives.
///
/// # Errors
///
/// Returns [`semver::Error`] when any alternative fails to parse.
pub fn parse_range(range: &str) -> Result<Vec<VersionReq>, semver::Error> {
    range.split("||").map(|alternative| VersionReq::parse(&normalize_alternative(alternative))).collect()
}

/// Rewrites one alternative into `semver` comparator syntax.
fn normalize_alternative(alternative: &str) -> String {
    let tokens: Vec<&str> = alternative.split_whitespace().collect();
    if let [low, "-", high] = tokens.as_slice() {
        return format!(">={}, <={}", strip_v(low), strip_v(high));
    }
    let mut comparators = Vec::new();
    let mut pending_operator = String::new();
    for token in tokens {
        if token.chars().all(|ch| OPERATOR_CHARS.contains(&ch)) {
            pending_operator.push_str(token);
            continue;
        }
        let operator_len = token.find(|ch: char| !OPERATOR_CHARS.contains(&ch)).unwrap_or(token.len());
        let mut operator = std::mem::take(&mut pending_operator);
        operator.push_str(&token[.. operator_len]);
        let version = strip_v(&token[operator_len ..]);
        if operator.is_empty() && !is_wildcard(version) {
            operator.push('=');
        }
        comparators.push(format!("{operator}{version}"));
    }
    if comparators.is_empty() {
        return "*".to_string();
    }
    comparators.join(", ")
}

/// Strips a leading `v` from a version token.
fn strip_v(token: &str) -> &str {
    token.strip_prefix(['v', 'V']).unwrap_or(token)
}

/// Returns true for versions with a wildcard component.
fn is_wildcard(version: &str) -> bool {
    version.split('.').any(|part| matches!(part, "*" | "x" | "X"))
}

// ============================================================================
// SECTION: Filtering
// ============================================================================

/// Keeps scripts whose version range admits `spec_version`.
///
/// # Errors
///
/// Returns [`CompileError::InvalidVersion`] when `spec_version` does not parse
/// and [`CompileError::RangeParseFailure`] for an unparsable script range.
pub fn filter_by_version(
    scripts: Vec<Script>,
    spec_version: &str,
    api_versions: &[String],
) -> Result<Vec<Script>, CompileError> {
    if api_versions.iter().any(|version| version.trim() == BYPASS_VERSION) {
        return Ok(scripts);
    }
    let version =
        parse_tolerant(spec_version).map_err(|err| CompileError::InvalidVersion(format!("{spec_version}: {err}")))?;
    let mut kept = Vec::with_capacity(scripts.len());
    for script in scripts {
        if script.api_version.trim().is_empty() {
            kept.push(script);
            continue;
        }
        let alternatives = parse_range(&script.api_version).map_err(|err| CompileError::RangeParseFailure {
            script: script.id.clone(),
            range: script.api_version.clone(),
            reason: err.to_string(),
        })?;
        if alternatives.iter().any(|requirement| requirement.matches(&version)) {
            kept.push(script);
        }
    }
    Ok(kept)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
