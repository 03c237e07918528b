// crates/fcs-core/src/manifest/mod.rs
// ============================================================================
// Module: Manifest Loading
// Description: Loaders for manifests, reference catalogues and discovery files.
// Purpose: Turn logical `file://` URIs into validated model values.
// Dependencies: crate::model, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Inputs are acquired by logical URI through a [`ManifestSource`]. The two
//! reference catalogues (assertions and body data) are merged into a single
//! lookup in which body data wins on name collisions, and structured bodies
//! are re-serialized to canonical JSON strings at load time.

// ============================================================================
// SECTION: Submodules
// ============================================================================

mod source;

pub use source::MAX_SOURCE_BYTES;
pub use source::ManifestSource;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::discovery::DiscoveryDocument;
use crate::model::discovery::DiscoveryError;
use crate::model::discovery::DiscoveryModel;
use crate::model::script::Manifest;
use crate::model::script::ReferenceCatalogue;
use crate::model::script::References;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default assertions catalogue URI.
pub const DEFAULT_ASSERTIONS_URI: &str = "file://manifests/assertions.json";

/// Default body-data catalogue URI.
pub const DEFAULT_DATA_URI: &str = "file://manifests/data.json";

/// Context key holding the API versions in force for a journey.
pub const API_VERSIONS_KEY: &str = "apiversions";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Manifest and reference loading errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// File missing after the parent-directory fallback.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    /// File content is not valid JSON for the expected shape.
    #[error("source decode failure: {0}")]
    DecodeFailure(String),
    /// URI scheme other than `file://`.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    /// URI could not be interpreted.
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    /// API-specific manifest requested without an API-version list.
    #[error("missing api versions in context for manifest {0}")]
    MissingVersionContext(String),
    /// File exceeds the configured size limit.
    #[error("{path} exceeds size limit of {max_bytes} bytes")]
    TooLarge {
        /// Offending path.
        path: String,
        /// Configured maximum.
        max_bytes: usize,
    },
}

// ============================================================================
// SECTION: Loaders
// ============================================================================

/// Loads an API-specific manifest.
///
/// # Errors
///
/// Returns [`ManifestError::MissingVersionContext`] when `api_versions` is
/// absent, and source or decode errors otherwise.
pub fn load_manifest(
    source: &ManifestSource,
    uri: &str,
    api_versions: Option<&[String]>,
) -> Result<Manifest, ManifestError> {
    load_manifest_bytes(source, uri, api_versions).map(|(manifest, _)| manifest)
}

/// Loads an API-specific manifest along with the bytes it was decoded from.
///
/// # Errors
///
/// Returns [`ManifestError::MissingVersionContext`] when `api_versions` is
/// absent, and source or decode errors otherwise.
pub fn load_manifest_bytes(
    source: &ManifestSource,
    uri: &str,
    api_versions: Option<&[String]>,
) -> Result<(Manifest, Vec<u8>), ManifestError> {
    if api_versions.is_none() {
        return Err(ManifestError::MissingVersionContext(uri.to_string()));
    }
    let bytes = source.read(uri)?;
    let manifest = decode(&bytes, uri)?;
    Ok((manifest, bytes))
}

/// Loads and merges the assertions and body-data catalogues.
///
/// # Errors
///
/// Returns source or decode errors for either catalogue.
pub fn load_references(
    source: &ManifestSource,
    assertions_uri: &str,
    data_uri: &str,
) -> Result<References, ManifestError> {
    let assertions = load_catalogue(source, assertions_uri)?;
    let data = load_catalogue(source, data_uri)?;
    Ok(References::merge(assertions, data))
}

/// Loads one catalogue and canonicalizes its bodies.
fn load_catalogue(source: &ManifestSource, uri: &str) -> Result<ReferenceCatalogue, ManifestError> {
    let bytes = source.read(uri)?;
    let mut catalogue: ReferenceCatalogue = decode(&bytes, uri)?;
    for (name, reference) in &mut catalogue.references {
        reference
            .canonicalize_body()
            .map_err(|err| ManifestError::DecodeFailure(format!("{uri}: reference {name}: {err}")))?;
    }
    Ok(catalogue)
}

/// Loads and validates a discovery document.
///
/// # Errors
///
/// Returns [`DiscoveryError::Io`] when the file cannot be read,
/// [`DiscoveryError::Decode`] for malformed JSON, and
/// [`DiscoveryError::Invalid`] when validation fails.
pub fn load_discovery(source: &ManifestSource, uri: &str) -> Result<DiscoveryModel, DiscoveryError> {
    let bytes = source.read(uri).map_err(|err| DiscoveryError::Io(err.to_string()))?;
    let document: DiscoveryDocument =
        serde_json::from_slice(&bytes).map_err(|err| DiscoveryError::Decode(format!("{uri}: {err}")))?;
    document.discovery_model.validate()?;
    Ok(document.discovery_model)
}

/// Decodes JSON bytes, tagging errors with the source URI.
fn decode<T: DeserializeOwned>(bytes: &[u8], uri: &str) -> Result<T, ManifestError> {
    serde_json::from_slice(bytes).map_err(|err| ManifestError::DecodeFailure(format!("{uri}: {err}")))
}
