// crates/fcs-config/src/lib.rs
// ============================================================================
// Module: Conformance Suite Config Library
// Description: Operator configuration model and validation.
// Purpose: Single source of truth for fcs.toml semantics.
// Dependencies: fcs-core, serde, toml
// ============================================================================

//! ## Overview
//! `fcs-config` loads the operator's TOML configuration: where the discovery
//! document lives, which API versions gate the manifests, the seed context,
//! and the runner, HTTP, report and logging settings. Loading is strict and
//! fail-closed; a configuration that does not validate is never returned.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
