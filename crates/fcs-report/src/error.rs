// crates/fcs-report/src/error.rs
// ============================================================================
// Module: Report Errors
// Description: Error types for report packaging and signing.
// Purpose: Give callers stable variants for every report failure mode.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ReportError`] covers validation and archive handling; [`SignatureError`]
//! covers key loading, JWS production and verification. Payloads are plain
//! strings so both enums stay comparable in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Report Errors
// ============================================================================

/// Errors raised while validating, exporting or importing reports.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Field validation failed; the payload joins every field message.
    #[error("{0}")]
    Invalid(String),
    /// An enum value is outside its table.
    #[error("{0}")]
    InvalidEnum(String),
    /// JSON encoding or decoding failed.
    #[error("report serialization failed: {0}")]
    Serialize(String),
    /// The ZIP container could not be written or read.
    #[error("report archive error: {0}")]
    Archive(String),
    /// The archive lacks the named member.
    #[error("could not find \"{0}\" in ZIP archive")]
    MissingEntry(String),
    /// Reading or writing the archive failed.
    #[error("report io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Signature Errors
// ============================================================================

/// Errors raised while signing or verifying report tokens.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// The key could not be read or decoded.
    #[error("signing key error: {0}")]
    Key(String),
    /// Producing the signature failed.
    #[error("signing failed: {0}")]
    Sign(String),
    /// The token is not a well-formed compact JWS.
    #[error("malformed token: {0}")]
    Malformed(String),
    /// The signature does not verify under the public key.
    #[error("signature verification failed: {0}")]
    Verification(String),
    /// The token header names another algorithm.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),
    /// The token expired.
    #[error("token expired")]
    Expired,
    /// The token is not valid yet.
    #[error("token not valid yet")]
    NotYetValid,
    /// The report digest claim differs from the local digest.
    #[error("report digest mismatch")]
    ReportDigestMismatch,
    /// The discovery digest claim differs from the local digest.
    #[error("discovery digest mismatch")]
    DiscoveryDigestMismatch,
    /// The manifest digest claim differs from the local digest.
    #[error("manifest digest mismatch")]
    ManifestDigestMismatch,
}
