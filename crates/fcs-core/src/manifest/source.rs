// crates/fcs-core/src/manifest/source.rs
// ============================================================================
// Module: Manifest Source
// Description: Bounded `file://` reader for manifests, references and discovery.
// Purpose: Resolve logical URIs to bytes with a parent-directory fallback.
// Dependencies: url
// ============================================================================

//! ## Overview
//! Manifest URIs are relative (`file://manifests/assertions.json`), so the
//! `file://` prefix is stripped and the remainder is resolved against the
//! source root. When the primary path does not exist the same path one
//! directory up is tried, which supports running from nested working
//! directories. Remote schemes are rejected.
//! Security posture: reads are size-limited and treat inputs as untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use url::Url;

use crate::manifest::ManifestError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of a single manifest, catalogue or discovery file.
pub const MAX_SOURCE_BYTES: usize = 16 * 1024 * 1024;

/// URI prefix for local files.
const FILE_PREFIX: &str = "file://";

// ============================================================================
// SECTION: Manifest Source
// ============================================================================

/// File-backed source for pipeline inputs.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    /// Directory relative paths resolve against; `None` uses the process directory.
    root: Option<PathBuf>,
    /// Maximum accepted file size in bytes.
    max_bytes: usize,
}

impl Default for ManifestSource {
    fn default() -> Self {
        Self::unrooted()
    }
}

impl ManifestSource {
    /// Creates a source resolving relative paths under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            max_bytes: MAX_SOURCE_BYTES,
        }
    }

    /// Creates a source resolving relative paths against the process directory.
    #[must_use]
    pub const fn unrooted() -> Self {
        Self {
            root: None,
            max_bytes: MAX_SOURCE_BYTES,
        }
    }

    /// Overrides the maximum accepted file size.
    #[must_use]
    pub const fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Resolves a logical URI to its primary local path.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnsupportedScheme`] for any scheme other than
    /// `file://` and [`ManifestError::InvalidUri`] for empty paths.
    pub fn resolve(&self, uri: &str) -> Result<PathBuf, ManifestError> {
        let raw = local_path(uri)?;
        Ok(self.anchor(raw))
    }

    /// Reads the bytes behind `uri`, probing `../path` when the primary path is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::SourceUnavailable`] when neither path exists and
    /// [`ManifestError::TooLarge`] when the file exceeds the size limit.
    pub fn read(&self, uri: &str) -> Result<Vec<u8>, ManifestError> {
        let raw = local_path(uri)?;
        let primary = self.anchor(raw);
        match self.read_with_limit(&primary) {
            Err(ManifestError::SourceUnavailable(primary_err)) if raw.is_relative() => {
                let fallback = self.anchor(&Path::new("..").join(raw));
                self.read_with_limit(&fallback).map_err(|err| match err {
                    ManifestError::SourceUnavailable(_) => {
                        ManifestError::SourceUnavailable(primary_err)
                    }
                    other => other,
                })
            }
            other => other,
        }
    }

    /// Joins relative paths onto the configured root.
    fn anchor(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Reads a file, failing closed on oversize content.
    fn read_with_limit(&self, path: &Path) -> Result<Vec<u8>, ManifestError> {
        let file = std::fs::File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => {
                ManifestError::SourceUnavailable(format!("{} not found", path.display()))
            }
            _ => ManifestError::SourceUnavailable(format!("{}: {err}", path.display())),
        })?;
        let limit = u64::try_from(self.max_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut limited = file.take(limit);
        let mut bytes = Vec::new();
        limited
            .read_to_end(&mut bytes)
            .map_err(|err| ManifestError::SourceUnavailable(format!("{}: {err}", path.display())))?;
        if bytes.len() > self.max_bytes {
            return Err(ManifestError::TooLarge {
                path: path.display().to_string(),
                max_bytes: self.max_bytes,
            });
        }
        Ok(bytes)
    }
}

/// Strips the `file://` prefix and rejects every other scheme.
fn local_path(uri: &str) -> Result<&Path, ManifestError> {
    let raw = match uri.strip_prefix(FILE_PREFIX) {
        Some(rest) => rest,
        None => {
            reject_remote(uri)?;
            uri
        }
    };
    if raw.trim().is_empty() {
        return Err(ManifestError::InvalidUri(uri.to_string()));
    }
    Ok(Path::new(raw))
}

/// Rejects URIs carrying a non-file scheme.
fn reject_remote(uri: &str) -> Result<(), ManifestError> {
    if !uri.contains("://") {
        return Ok(());
    }
    match Url::parse(uri) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Err(ManifestError::UnsupportedScheme(format!("{}: not implemented", url.scheme())))
        }
        Ok(url) => Err(ManifestError::UnsupportedScheme(url.scheme().to_string())),
        Err(err) => Err(ManifestError::InvalidUri(format!("{uri}: {err}"))),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn http_schemes_are_not_implemented() {
        let source = ManifestSource::unrooted();
        let err = source.read("https://example.org/manifest.json").unwrap_err();
        assert_eq!(err, ManifestError::UnsupportedScheme("https: not implemented".to_string()));
        let err = source.read("ftp://example.org/manifest.json").unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedScheme(_)));
    }

    #[test]
    fn relative_file_uris_resolve_under_root() {
        let source = ManifestSource::new("/srv/fcs");
        let path = source.resolve("file://manifests/data.json").unwrap();
        assert_eq!(path, PathBuf::from("/srv/fcs/manifests/data.json"));
    }

    #[test]
    fn missing_file_falls_back_one_directory_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("manifests")).unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("manifests/data.json"), b"{}").unwrap();
        let source = ManifestSource::new(dir.path().join("nested"));
        let bytes = source.read("file://manifests/data.json").unwrap();
        assert_eq!(bytes, b"{}");
    }

    #[test]
    fn oversize_files_fail_closed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("big.json"), vec![b' '; 64]).unwrap();
        let source = ManifestSource::new(dir.path()).with_max_bytes(16);
        let err = source.read("file://big.json").unwrap_err();
        assert!(matches!(err, ManifestError::TooLarge { .. }));
    }
}
