// crates/fcs-config/src/config.rs
// ============================================================================
// Module: Conformance Suite Configuration
// Description: Configuration loading and validation for conformance runs.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: fcs-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path is taken from the caller, then the `FCS_CONFIG` environment
//! variable, then `fcs.toml` in the working directory. Every section has
//! defaults except `discovery`, which must name a `file://` document.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use fcs_core::Context;
use fcs_core::parse_tolerant;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "fcs.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "FCS_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Required scheme of the discovery URI.
const FILE_SCHEME: &str = "file://";
/// Maximum run deadline in seconds.
pub const MAX_RUNNER_TIMEOUT_SECS: u64 = 3600;
/// Maximum result channel capacity.
pub const MAX_RESULTS_CAPACITY: usize = 65_536;
/// Maximum HTTP timeout in seconds.
pub const MAX_HTTP_TIMEOUT_SECS: u64 = 3600;
/// Maximum report validity in seconds (366 days).
pub const MAX_REPORT_VALIDITY_SECS: u64 = 366 * 24 * 60 * 60;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Conformance suite configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FcsConfig {
    /// Discovery document URI (`file://` only).
    pub discovery: String,
    /// API versions gating manifest scripts; `0.0.0` disables range filtering.
    #[serde(default)]
    pub api_versions: Vec<String>,
    /// Seed values for the parent context.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Result collection settings.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Outbound HTTP settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Report packaging settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// Structured event logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FcsConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content =
            std::str::from_utf8(&bytes).map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some(discovery_path) = self.discovery.trim().strip_prefix(FILE_SCHEME) else {
            return Err(ConfigError::Invalid("discovery must be a file:// URI".to_string()));
        };
        validate_path_string("discovery", discovery_path)?;
        for version in &self.api_versions {
            if parse_tolerant(version).is_err() {
                return Err(ConfigError::Invalid(format!("api_versions entry {version} is not a version")));
            }
        }
        for key in self.context.keys() {
            if !is_context_key(key) {
                return Err(ConfigError::Invalid(format!("context key {key} must match [A-Za-z0-9_-]+")));
            }
        }
        self.runner.validate()?;
        self.http.validate()?;
        self.report.validate()?;
        self.logging.validate()
    }

    /// Returns a context seeded with the configured values.
    #[must_use]
    pub fn seed_context(&self) -> Context {
        let mut context = Context::new();
        for (key, value) in &self.context {
            context.put_string(key.clone(), value.clone());
        }
        context
    }
}

/// Result collection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Deadline for collecting every result, in seconds.
    #[serde(default = "default_runner_timeout_secs")]
    pub timeout_secs: u64,
    /// Capacity of the buffered results channel.
    #[serde(default = "default_results_capacity")]
    pub results_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_runner_timeout_secs(),
            results_capacity: default_results_capacity(),
        }
    }
}

impl RunnerConfig {
    /// Returns the collection deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates runner bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_RUNNER_TIMEOUT_SECS).contains(&self.timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "runner.timeout_secs must be between 1 and {MAX_RUNNER_TIMEOUT_SECS}"
            )));
        }
        if !(1 ..= MAX_RESULTS_CAPACITY).contains(&self.results_capacity) {
            return Err(ConfigError::Invalid(format!(
                "runner.results_capacity must be between 1 and {MAX_RESULTS_CAPACITY}"
            )));
        }
        Ok(())
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for long-running calls such as test execution, in seconds.
    #[serde(default = "default_long_timeout_secs")]
    pub long_timeout_secs: u64,
    /// Disables TLS certificate verification.
    #[serde(default = "default_insecure_skip_verify")]
    pub insecure_skip_verify: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            long_timeout_secs: default_long_timeout_secs(),
            insecure_skip_verify: default_insecure_skip_verify(),
        }
    }
}

impl HttpConfig {
    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the long-call timeout.
    #[must_use]
    pub const fn long_timeout(&self) -> Duration {
        Duration::from_secs(self.long_timeout_secs)
    }

    /// Validates HTTP bounds.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(1 ..= MAX_HTTP_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "http.request_timeout_secs must be between 1 and {MAX_HTTP_TIMEOUT_SECS}"
            )));
        }
        if !(self.request_timeout_secs ..= MAX_HTTP_TIMEOUT_SECS).contains(&self.long_timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "http.long_timeout_secs must be between request_timeout_secs and {MAX_HTTP_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }
}

/// Report packaging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Token issuer claim.
    #[serde(default = "default_report_issuer")]
    pub issuer: String,
    /// Token subject claim.
    #[serde(default = "default_report_subject")]
    pub subject: String,
    /// Report and token validity, in seconds.
    #[serde(default = "default_report_validity_secs")]
    pub validity_secs: u64,
    /// Optional PEM RSA key used to sign reports.
    #[serde(default)]
    pub signing_key: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            issuer: default_report_issuer(),
            subject: default_report_subject(),
            validity_secs: default_report_validity_secs(),
            signing_key: None,
        }
    }
}

impl ReportConfig {
    /// Returns the report validity.
    #[must_use]
    pub const fn validity(&self) -> Duration {
        Duration::from_secs(self.validity_secs)
    }

    /// Validates report settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::Invalid("report.issuer must be non-empty".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(ConfigError::Invalid("report.subject must be non-empty".to_string()));
        }
        if !(1 ..= MAX_REPORT_VALIDITY_SECS).contains(&self.validity_secs) {
            return Err(ConfigError::Invalid(format!(
                "report.validity_secs must be between 1 and {MAX_REPORT_VALIDITY_SECS}"
            )));
        }
        if let Some(path) = &self.signing_key {
            validate_path_string("report.signing_key", path)?;
        }
        Ok(())
    }
}

/// Destination of structured events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSink {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    None,
}

/// Structured event logging settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Event destination.
    #[serde(default)]
    pub sink: LogSink,
    /// Event file path, required for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (&self.sink, &self.path) {
            (LogSink::File, None) => Err(ConfigError::Invalid("logging.path is required for the file sink".to_string())),
            (_, Some(path)) => validate_path_string("logging.path", path),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Returns true for keys usable as `$name` context tokens.
fn is_context_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}

/// Default collection deadline (5 minutes).
const fn default_runner_timeout_secs() -> u64 {
    300
}

/// Default results channel capacity.
const fn default_results_capacity() -> usize {
    100
}

/// Default per-request timeout.
const fn default_request_timeout_secs() -> u64 {
    25
}

/// Default long-call timeout.
const fn default_long_timeout_secs() -> u64 {
    300
}

/// Default TLS verification bypass.
const fn default_insecure_skip_verify() -> bool {
    true
}

/// Default token issuer.
fn default_report_issuer() -> String {
    "fcs".to_string()
}

/// Default token subject.
fn default_report_subject() -> String {
    "conformance-report".to_string()
}

/// Default report validity (60 days).
const fn default_report_validity_secs() -> u64 {
    60 * 24 * 60 * 60
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn context_keys_follow_token_grammar() {
        assert!(is_context_key("x-fapi-financial-id"));
        assert!(is_context_key("consent_id2"));
        assert!(!is_context_key("bad key"));
        assert!(!is_context_key(""));
    }

    #[test]
    fn validate_path_string_rejects_blank_and_long_components() {
        assert!(validate_path_string("logging.path", "  ").unwrap_err().to_string().contains("non-empty"));
        let component = "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1);
        let err = validate_path_string("logging.path", &component).unwrap_err();
        assert!(err.to_string().contains("path component too long"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let runner = RunnerConfig::default();
        assert_eq!(runner.timeout(), Duration::from_secs(300));
        assert_eq!(runner.results_capacity, 100);
        let http = HttpConfig::default();
        assert_eq!(http.request_timeout(), Duration::from_secs(25));
        assert!(http.insecure_skip_verify);
        assert_eq!(ReportConfig::default().validity(), Duration::from_secs(5_184_000));
    }
}
