// crates/fcs-core/src/model/mod.rs
// ============================================================================
// Module: Conformance Model Types
// Description: Canonical manifest, discovery, context, and test-case structures.
// Purpose: Provide stable, serializable types shared by every pipeline stage.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Model types describe what operators supply (discovery documents, manifest
//! scripts, reference catalogues) and what the compiler produces (test cases,
//! expectations, results). These types are the canonical source of truth for
//! the wire formats streamed to the runner and written into reports.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod discovery;
pub mod expect;
pub mod hashing;
pub mod http;
pub mod identifiers;
pub mod json_path;
pub mod path_template;
pub mod results;
pub mod script;
pub mod spec_type;
pub mod testcase;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::Context;
pub use context::ContextError;
pub use context::ContextValue;
pub use context::MAX_SUBSTITUTION_DEPTH;
pub use context::Substitution;
pub use context::SubstitutionMode;
pub use discovery::ApiSpecification;
pub use discovery::ConditionalProperty;
pub use discovery::DiscoveryDocument;
pub use discovery::DiscoveryError;
pub use discovery::DiscoveryItem;
pub use discovery::DiscoveryModel;
pub use discovery::Endpoint;
pub use expect::ContextPut;
pub use expect::Expect;
pub use expect::Match;
pub use expect::MatchOutcome;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use http::Headers;
pub use http::HttpRequest;
pub use http::HttpResponse;
pub use identifiers::TestCaseId;
pub use identifiers::TokenName;
pub use path_template::PathTemplate;
pub use results::TestResult;
pub use script::ContextPutDirective;
pub use script::Manifest;
pub use script::Reference;
pub use script::ReferenceCatalogue;
pub use script::References;
pub use script::Script;
pub use spec_type::SpecType;
pub use testcase::INTERACTION_ID_PLACEHOLDER;
pub use testcase::Input;
pub use testcase::TestCase;
