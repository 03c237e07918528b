// crates/fcs-runner/src/error.rs
// ============================================================================
// Module: Runner Errors
// Description: Error taxonomy for journey orchestration and result collection.
// Purpose: Give every runner failure a stable, matchable variant.
// Dependencies: fcs-core, thiserror
// ============================================================================

//! ## Overview
//! Runner errors wrap the fatal failures of the pipeline stages the runner
//! drives (discovery, compilation, validator loading) and add the failures of
//! its own boundaries: the result stream, the aggregation deadline, outbound
//! HTTP and the version check.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_core::CompileError;
use fcs_core::DiscoveryError;
use fcs_core::ManifestError;
use fcs_core::PermissionError;
use fcs_core::ValidatorError;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Runner failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    /// Aggregation deadline elapsed before the stream ended.
    #[error("timeout running tests")]
    Timeout,
    /// Result stream framing or transport failure.
    #[error("result stream error: {0}")]
    Stream(String),
    /// A result handler rejected a message.
    #[error("result handler error: {0}")]
    Handler(String),
    /// Test-plan compilation failed.
    #[error("compile error: {0}")]
    Compile(String),
    /// Discovery document could not be loaded.
    #[error("discovery error: {0}")]
    Discovery(String),
    /// Response validator could not be built.
    #[error("validator error: {0}")]
    Validator(String),
    /// Outbound HTTP failure.
    #[error("http error: {0}")]
    Http(String),
    /// Version check failure.
    #[error("version check error: {0}")]
    Version(String),
    /// Report building, signing or verification failure.
    #[error("report error: {0}")]
    Report(String),
}

impl From<CompileError> for RunnerError {
    fn from(err: CompileError) -> Self {
        Self::Compile(err.to_string())
    }
}

impl From<ManifestError> for RunnerError {
    fn from(err: ManifestError) -> Self {
        Self::Compile(err.to_string())
    }
}

impl From<PermissionError> for RunnerError {
    fn from(err: PermissionError) -> Self {
        Self::Compile(err.to_string())
    }
}

impl From<DiscoveryError> for RunnerError {
    fn from(err: DiscoveryError) -> Self {
        Self::Discovery(err.to_string())
    }
}

impl From<ValidatorError> for RunnerError {
    fn from(err: ValidatorError) -> Self {
        Self::Validator(err.to_string())
    }
}
