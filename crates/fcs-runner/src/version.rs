// crates/fcs-runner/src/version.rs
// ============================================================================
// Module: Version Updater
// Description: Compares the running suite version with published tags.
// Purpose: Tell operators when a newer suite release exists.
// Dependencies: fcs-core, semver, serde, serde_json
// ============================================================================

//! ## Overview
//! The tag endpoint returns a JSON array of `{"name": ...}` objects. Tags are
//! parsed tolerantly (`v` prefixes and missing components are accepted);
//! tags that still fail to parse are ignored. The highest tag is compared
//! with [`FULL_VERSION`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_core::parse_tolerant;
use semver::Version;
use serde::Deserialize;
use serde::Serialize;

use crate::error::RunnerError;
use crate::transport::HttpTransport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Version of the running suite.
pub const FULL_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// SECTION: Tags
// ============================================================================

/// One entry of the tag list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct Tag {
    /// Tag name.
    name: String,
}

/// Sorts parseable tags ascending; equal versions keep their input order.
#[must_use]
pub fn sort_tags(tags: &[String]) -> Vec<String> {
    let mut parsed: Vec<(Version, &String)> =
        tags.iter().filter_map(|tag| parse_tolerant(tag).ok().map(|version| (version, tag))).collect();
    parsed.sort_by(|left, right| left.0.cmp(&right.0));
    parsed.into_iter().map(|(_, tag)| tag.clone()).collect()
}

// ============================================================================
// SECTION: Checker
// ============================================================================

/// Outcome of a version check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateStatus {
    /// Version of the running suite.
    pub current: String,
    /// Highest published tag, if any parsed.
    pub latest: Option<String>,
    /// True when `latest` is newer than `current`.
    pub update_available: bool,
}

/// Fetches published tags and compares them with a local version.
#[derive(Debug, Clone)]
pub struct VersionChecker {
    /// Tag list URL.
    url: String,
    /// Local version compared against the tags.
    current: String,
}

impl VersionChecker {
    /// Creates a checker comparing against [`FULL_VERSION`].
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            current: FULL_VERSION.to_string(),
        }
    }

    /// Overrides the local version.
    #[must_use]
    pub fn with_current(mut self, current: impl Into<String>) -> Self {
        self.current = current.into();
        self
    }

    /// Fetches the tag list and compares it with the local version.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Http`] when the fetch fails and
    /// [`RunnerError::Version`] when the list or the local version is invalid.
    pub fn check(&self, transport: &HttpTransport) -> Result<UpdateStatus, RunnerError> {
        let bytes = transport.get_bytes(&self.url)?;
        let tags: Vec<Tag> =
            serde_json::from_slice(&bytes).map_err(|err| RunnerError::Version(format!("invalid tag list: {err}")))?;
        let names: Vec<String> = tags.into_iter().map(|tag| tag.name).collect();
        self.compare(&names)
    }

    /// Compares already-fetched tag names with the local version.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Version`] when the local version does not parse.
    pub fn compare(&self, tags: &[String]) -> Result<UpdateStatus, RunnerError> {
        let current = parse_tolerant(&self.current)
            .map_err(|err| RunnerError::Version(format!("{}: {err}", self.current)))?;
        let latest = sort_tags(tags).pop();
        let update_available = latest
            .as_deref()
            .and_then(|tag| parse_tolerant(tag).ok())
            .is_some_and(|version| version > current);
        Ok(UpdateStatus {
            current: self.current.clone(),
            latest,
            update_available,
        })
    }
}
