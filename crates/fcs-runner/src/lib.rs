// crates/fcs-runner/src/lib.rs
// ============================================================================
// Module: Conformance Suite Runner Library
// Description: Journey orchestration around the core pipeline.
// Purpose: Plan test runs, collect streamed results and certify reports.
// Dependencies: fcs-config, fcs-core, fcs-report, fcs-schema, reqwest, tokio
// ============================================================================

//! ## Overview
//! The runner is the boundary the core leaves open. A [`Journey`] compiles
//! a discovery document into a [`TestPlan`]; [`prepare`] and [`evaluate`]
//! bracket each HTTP exchange; a [`ResultStreamReader`] and a
//! [`ResultAggregator`] collect the results an execution server pushes back;
//! [`build_report`] and [`sign_report`] turn the run into a certified report.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregate;
pub mod certify;
pub mod error;
pub mod evaluate;
pub mod journey;
pub mod logging;
pub mod output;
pub mod stream;
pub mod transport;
pub mod version;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::DEFAULT_RUN_TIMEOUT;
pub use aggregate::ResultAggregator;
pub use certify::build_report;
pub use certify::sign_report;
pub use certify::verify_report;
pub use error::RunnerError;
pub use evaluate::SCHEMA_VALIDATION_SKIPPED_EVENT;
pub use evaluate::evaluate;
pub use evaluate::prepare;
pub use journey::Journey;
pub use journey::SpecificationPlan;
pub use journey::TEST_PLAN_COMPILED_EVENT;
pub use journey::TestPlan;
pub use journey::ValidatorMap;
pub use logging::event_sink;
pub use output::all_passed;
pub use output::write_results;
pub use stream::Dispatch;
pub use stream::MessageHandler;
pub use stream::ResultStreamReader;
pub use stream::StreamChannels;
pub use stream::StreamEnd;
pub use stream::StreamMessage;
pub use stream::default_handlers;
pub use stream::encode_frame;
pub use stream::read_frame;
pub use stream::write_frame;
pub use transport::HttpTransport;
pub use transport::INSECURE_CONNECTION_EVENT;
pub use version::FULL_VERSION;
pub use version::UpdateStatus;
pub use version::VersionChecker;
pub use version::sort_tags;
