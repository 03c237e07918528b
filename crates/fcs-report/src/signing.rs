// crates/fcs-report/src/signing.rs
// ============================================================================
// Module: Report Signing
// Description: PS256 compact JWS over report digests.
// Purpose: Bind a report, its discovery model and manifest to an issuer key.
// Dependencies: base64, fcs-core, rand, rsa, serde_json, sha2, time
// ============================================================================

//! ## Overview
//! A report token is a compact JWS (`header.claims.signature`, each part
//! base64url without padding) signed with RSASSA-PSS over SHA-256. Claims
//! carry the standard issuer, subject, id and validity window plus the hex
//! SHA-256 digests of the canonical report, the canonical discovery model and
//! the raw manifest bytes.
//!
//! Extra header parameters from the caller's metadata map are copied into the
//! JOSE header, except `alg`, which always names PS256.
//!
//! Verification checks, in order: token shape, algorithm, signature,
//! validity window, then the report, discovery and manifest digests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL;
use fcs_core::DEFAULT_HASH_ALGORITHM;
use fcs_core::DiscoveryModel;
use fcs_core::HashDigest;
use rsa::RsaPrivateKey;
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::pss::BlindedSigningKey;
use rsa::pss::Signature;
use rsa::pss::VerifyingKey;
use rsa::signature::RandomizedSigner;
use rsa::signature::SignatureEncoding;
use rsa::signature::Verifier;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use sha2::Sha256;
use time::Duration;
use time::OffsetDateTime;

use crate::error::SignatureError;
use crate::report::Report;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JOSE algorithm name for RSASSA-PSS with SHA-256.
pub const SIGNING_ALGORITHM: &str = "PS256";

/// Maximum accepted key file size in bytes.
pub const MAX_SIGNING_KEY_BYTES: usize = 64 * 1024;

/// Default token type header.
const TOKEN_TYPE: &str = "JWT";

// ============================================================================
// SECTION: Digests
// ============================================================================

/// Digests bound into a report token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDigests {
    /// Hex SHA-256 of the canonical report.
    pub report: String,
    /// Hex SHA-256 of the canonical discovery model.
    pub discovery: String,
    /// Hex SHA-256 of the raw manifest bytes.
    pub manifest: String,
}

impl ReportDigests {
    /// Computes the digests for a report, discovery model and manifest.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Sign`] when canonicalization fails.
    pub fn compute(report: &Report, discovery: &DiscoveryModel, manifest: &[u8]) -> Result<Self, SignatureError> {
        let report = HashDigest::of_canonical_json(DEFAULT_HASH_ALGORITHM, report)
            .map_err(|err| SignatureError::Sign(err.to_string()))?;
        let discovery = HashDigest::of_canonical_json(DEFAULT_HASH_ALGORITHM, discovery)
            .map_err(|err| SignatureError::Sign(err.to_string()))?;
        let manifest = HashDigest::of_bytes(DEFAULT_HASH_ALGORITHM, manifest);
        Ok(Self {
            report: report.value,
            discovery: discovery.value,
            manifest: manifest.value,
        })
    }
}

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Claims carried by a report token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportClaims {
    /// Issuer.
    pub iss: String,
    /// Subject.
    pub sub: String,
    /// Token identifier; the report id.
    pub jti: String,
    /// Not-before, seconds since the Unix epoch.
    pub nbf: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Hex SHA-256 of the canonical report.
    pub report_digest: String,
    /// Hex SHA-256 of the canonical discovery model.
    pub discovery_digest: String,
    /// Hex SHA-256 of the raw manifest bytes.
    pub manifest_digest: String,
}

impl ReportClaims {
    /// Creates claims valid from `not_before` for `validity`.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        report_id: impl Into<String>,
        digests: ReportDigests,
        not_before: OffsetDateTime,
        validity: Duration,
    ) -> Self {
        let nbf = not_before.unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            jti: report_id.into(),
            nbf,
            exp: nbf.saturating_add(validity.whole_seconds()),
            report_digest: digests.report,
            discovery_digest: digests.discovery,
            manifest_digest: digests.manifest,
        }
    }
}

// ============================================================================
// SECTION: Signer
// ============================================================================

/// PS256 signer holding an RSA private key.
pub struct ReportSigner {
    /// Blinded PSS signing key.
    key: BlindedSigningKey<Sha256>,
    /// Matching public key.
    public: RsaPublicKey,
}

impl fmt::Debug for ReportSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportSigner").finish_non_exhaustive()
    }
}

impl ReportSigner {
    /// Wraps an RSA private key.
    #[must_use]
    pub fn new(key: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&key);
        Self {
            key: BlindedSigningKey::new(key),
            public,
        }
    }

    /// Decodes a PKCS#8 or PKCS#1 PEM private key.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Key`] when neither encoding decodes.
    pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|err| SignatureError::Key(err.to_string()))?;
        Ok(Self::new(key))
    }

    /// Loads a PEM private key from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Key`] when the file is unreadable, larger
    /// than [`MAX_SIGNING_KEY_BYTES`] or not a valid key.
    pub fn from_file(path: &Path) -> Result<Self, SignatureError> {
        Self::from_pem(&read_key_text(path)?)
    }

    /// Returns a verifier for this signer's public key.
    #[must_use]
    pub fn verifier(&self) -> ReportVerifier {
        ReportVerifier::new(self.public.clone())
    }

    /// Signs `claims`, copying `metadata` into the header.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Sign`] when encoding or signing fails.
    pub fn sign(&self, claims: &ReportClaims, metadata: &Map<String, Value>) -> Result<String, SignatureError> {
        let mut header = Map::new();
        for (name, value) in metadata {
            if name != "alg" {
                header.insert(name.clone(), value.clone());
            }
        }
        header.insert("alg".to_string(), Value::String(SIGNING_ALGORITHM.to_string()));
        header.entry("typ").or_insert_with(|| Value::String(TOKEN_TYPE.to_string()));

        let header = serde_json::to_vec(&header).map_err(|err| SignatureError::Sign(err.to_string()))?;
        let claims = serde_json::to_vec(claims).map_err(|err| SignatureError::Sign(err.to_string()))?;
        let signing_input = format!("{}.{}", BASE64URL.encode(header), BASE64URL.encode(claims));
        let signature = self
            .key
            .try_sign_with_rng(&mut rand::thread_rng(), signing_input.as_bytes())
            .map_err(|err| SignatureError::Sign(err.to_string()))?;
        Ok(format!("{signing_input}.{}", BASE64URL.encode(signature.to_bytes())))
    }
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// PS256 verifier holding an RSA public key.
pub struct ReportVerifier {
    /// PSS verifying key.
    key: VerifyingKey<Sha256>,
}

impl fmt::Debug for ReportVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportVerifier").finish_non_exhaustive()
    }
}

impl ReportVerifier {
    /// Wraps an RSA public key.
    #[must_use]
    pub fn new(key: RsaPublicKey) -> Self {
        Self {
            key: VerifyingKey::new(key),
        }
    }

    /// Decodes an SPKI or PKCS#1 PEM public key.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Key`] when neither encoding decodes.
    pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|err| SignatureError::Key(err.to_string()))?;
        Ok(Self::new(key))
    }

    /// Loads a PEM public key from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Key`] when the file is unreadable, larger
    /// than [`MAX_SIGNING_KEY_BYTES`] or not a valid key.
    pub fn from_file(path: &Path) -> Result<Self, SignatureError> {
        Self::from_pem(&read_key_text(path)?)
    }

    /// Verifies `token` at `now` against locally computed digests.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Malformed`] for undecodable tokens,
    /// [`SignatureError::UnsupportedAlgorithm`] for non-PS256 headers,
    /// [`SignatureError::Verification`] for bad signatures,
    /// [`SignatureError::NotYetValid`] or [`SignatureError::Expired`] outside
    /// the validity window, and the matching digest mismatch variant when a
    /// digest claim differs from `expected`.
    pub fn verify(
        &self,
        token: &str,
        expected: &ReportDigests,
        now: OffsetDateTime,
    ) -> Result<ReportClaims, SignatureError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_segment, claims_segment, signature_segment] = segments.as_slice() else {
            return Err(SignatureError::Malformed(format!("expected 3 segments, got {}", segments.len())));
        };

        let header: Map<String, Value> = decode_segment(header_segment)?;
        match header.get("alg").and_then(Value::as_str) {
            Some(SIGNING_ALGORITHM) => {}
            Some(other) => return Err(SignatureError::UnsupportedAlgorithm(other.to_string())),
            None => return Err(SignatureError::Malformed("header has no alg".to_string())),
        }

        let signature_bytes = BASE64URL
            .decode(signature_segment)
            .map_err(|err| SignatureError::Malformed(format!("signature: {err}")))?;
        let signature = Signature::try_from(signature_bytes.as_slice())
            .map_err(|err| SignatureError::Malformed(format!("signature: {err}")))?;
        let signing_input = format!("{header_segment}.{claims_segment}");
        self.key
            .verify(signing_input.as_bytes(), &signature)
            .map_err(|err| SignatureError::Verification(err.to_string()))?;

        let claims: ReportClaims = decode_segment(claims_segment)?;
        let now = now.unix_timestamp();
        if now < claims.nbf {
            return Err(SignatureError::NotYetValid);
        }
        if now >= claims.exp {
            return Err(SignatureError::Expired);
        }
        if claims.report_digest != expected.report {
            return Err(SignatureError::ReportDigestMismatch);
        }
        if claims.discovery_digest != expected.discovery {
            return Err(SignatureError::DiscoveryDigestMismatch);
        }
        if claims.manifest_digest != expected.manifest {
            return Err(SignatureError::ManifestDigestMismatch);
        }
        Ok(claims)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes one base64url JSON segment.
fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, SignatureError> {
    let bytes = BASE64URL.decode(segment).map_err(|err| SignatureError::Malformed(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| SignatureError::Malformed(err.to_string()))
}

/// Reads a key file as UTF-8, bounded by [`MAX_SIGNING_KEY_BYTES`].
fn read_key_text(path: &Path) -> Result<String, SignatureError> {
    let file = File::open(path).map_err(|err| SignatureError::Key(format!("{}: {err}", path.display())))?;
    let limit = u64::try_from(MAX_SIGNING_KEY_BYTES).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| SignatureError::Key(format!("{}: {err}", path.display())))?;
    if bytes.len() > MAX_SIGNING_KEY_BYTES {
        return Err(SignatureError::Key(format!(
            "{}: key exceeds {MAX_SIGNING_KEY_BYTES} bytes",
            path.display()
        )));
    }
    String::from_utf8(bytes).map_err(|_| SignatureError::Key(format!("{}: key is not UTF-8", path.display())))
}
