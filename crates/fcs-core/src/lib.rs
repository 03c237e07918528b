// crates/fcs-core/src/lib.rs
// ============================================================================
// Module: Conformance Suite Core Library
// Description: Public API surface for the conformance test-case pipeline.
// Purpose: Expose model types, manifest loading, and the script compiler.
// Dependencies: crate::{model, manifest, compiler, interfaces, events}
// ============================================================================

//! ## Overview
//! The core turns a bank's discovery document and curated manifests into an
//! ordered list of runnable test cases. It loads manifests and reference
//! catalogues, filters scripts to the endpoints a bank implements, compiles
//! scripts against a [`Context`], and packs the compiled test cases into the
//! minimum number of access tokens. The core never performs HTTP round-trips;
//! responses are presented by the surrounding runner and evaluated here.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compiler;
pub mod events;
pub mod interfaces;
pub mod manifest;
pub mod model;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use model::*;

pub use compiler::BuiltinMacro;
pub use compiler::CompileError;
pub use compiler::CompileRequest;
pub use compiler::Compiler;
pub use compiler::EndpointFilter;
pub use compiler::MacroError;
pub use compiler::MacroTable;
pub use compiler::PermissionError;
pub use compiler::PermissionSet;
pub use compiler::SUPPLEMENTARY_DATA_SCHEMA;
pub use compiler::TokenGroup;
pub use compiler::TokenNamer;
pub use compiler::filter_by_version;
pub use compiler::group_permissions;
pub use compiler::inject_conditional_properties;
pub use compiler::inject_tokens;
pub use compiler::parse_tolerant;
pub use compiler::permission_sets;
pub use events::EventLevel;
pub use events::EventSink;
pub use events::FileEventSink;
pub use events::MemoryEventSink;
pub use events::NoopEventSink;
pub use events::PipelineEvent;
pub use events::StderrEventSink;
pub use interfaces::Failure;
pub use interfaces::PropertyKind;
pub use interfaces::Validator;
pub use interfaces::ValidatorError;
pub use manifest::DEFAULT_ASSERTIONS_URI;
pub use manifest::DEFAULT_DATA_URI;
pub use manifest::ManifestError;
pub use manifest::ManifestSource;
pub use manifest::load_discovery;
pub use manifest::load_manifest;
pub use manifest::load_manifest_bytes;
pub use manifest::load_references;
