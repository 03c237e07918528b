// crates/fcs-core/src/compiler/mod.rs
// ============================================================================
// Module: Script Compiler
// Description: Filtering, compilation and token planning for manifest scripts.
// Purpose: Turn manifest scripts into runnable, token-grouped test cases.
// Dependencies: crate::model, crate::events, regex, semver, time
// ============================================================================

//! ## Overview
//! Compilation runs in fixed stages: the [`EndpointFilter`] keeps scripts
//! whose URIs match endpoints the bank declares, [`filter_by_version`] drops
//! scripts outside the specification version, the [`Compiler`] resolves
//! parameters, macros and assertions into [`crate::TestCase`]s, conditional
//! properties are injected into request bodies, and finally test cases are
//! grouped into access tokens.
//!
//! Compile errors are fatal and identify the offending script by ID.

// ============================================================================
// SECTION: Submodules
// ============================================================================

mod builder;
mod conditional;
mod filter;
mod macros;
mod permissions;
mod versions;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use builder::CompileRequest;
pub use builder::Compiler;
pub use conditional::SUPPLEMENTARY_DATA_SCHEMA;
pub use conditional::inject_conditional_properties;
pub use filter::EndpointFilter;
pub use macros::BuiltinMacro;
pub use macros::MacroError;
pub use macros::MacroTable;
pub use permissions::CLIENT_CREDENTIALS_TOKEN;
pub use permissions::PermissionError;
pub use permissions::PermissionSet;
pub use permissions::TokenGroup;
pub use permissions::TokenNamer;
pub use permissions::group_permissions;
pub use permissions::inject_tokens;
pub use permissions::permission_sets;
pub use versions::BYPASS_VERSION;
pub use versions::filter_by_version;
pub use versions::parse_range;
pub use versions::parse_tolerant;

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal compilation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Script-level variants carry the offending script ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Schema URL does not map to a known API family.
    #[error("unknown specification: {0}")]
    UnknownSpecification(String),
    /// Script invoked a macro that is not in the macro table.
    #[error("script {script}: unknown macro {name}")]
    UnknownMacro {
        /// Script identifier.
        script: String,
        /// Macro name.
        name: String,
    },
    /// `$fn:` value did not have the form `$fn:NAME(ARGS)`.
    #[error("script {script}: malformed function call {call}")]
    MalformedFunctionCall {
        /// Script identifier.
        script: String,
        /// Offending parameter value.
        call: String,
    },
    /// Script referenced an assertion that is not in the catalogue.
    #[error("script {script}: missing reference {reference}")]
    MissingReference {
        /// Script identifier.
        script: String,
        /// Reference name.
        reference: String,
    },
    /// Script `apiVersion` is not a valid version range.
    #[error("script {script}: cannot parse version range {range}: {reason}")]
    RangeParseFailure {
        /// Script identifier.
        script: String,
        /// Range expression.
        range: String,
        /// Parser message.
        reason: String,
    },
    /// Specification version is not a valid semantic version.
    #[error("invalid specification version {0}")]
    InvalidVersion(String),
    /// Endpoint pattern or path template could not be compiled.
    #[error("invalid endpoint pattern: {0}")]
    InvalidPattern(String),
    /// Context substitution failed.
    #[error("script {script}: {message}")]
    Context {
        /// Script identifier.
        script: String,
        /// Context error message.
        message: String,
    },
    /// Macro rejected its arguments.
    #[error("script {script}: {message}")]
    Macro {
        /// Script identifier.
        script: String,
        /// Macro error message.
        message: String,
    },
    /// Manifest or reference loading failed.
    #[error("manifest error: {0}")]
    Manifest(String),
}
