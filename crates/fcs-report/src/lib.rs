// crates/fcs-report/src/lib.rs
// ============================================================================
// Module: Conformance Suite Report Library
// Description: Report model, validation, archive packaging and signing.
// Purpose: Turn a finished run into a portable, verifiable report artifact.
// Dependencies: crate::{report, builder, archive, signing, error}
// ============================================================================

//! ## Overview
//! A [`Report`] captures who ran the suite, against which discovery model,
//! and what every test case returned. Reports are validated before they are
//! written, packed into a ZIP archive holding a single `report.json` member,
//! and optionally bound to a PS256 JWS whose claims carry digests of the
//! report, the discovery model and the manifest.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod archive;
pub mod builder;
pub mod error;
pub mod report;
pub mod signing;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archive::MAX_ARCHIVE_BYTES;
pub use archive::REPORT_ENTRY;
pub use archive::archive_bytes;
pub use archive::export_report;
pub use archive::export_report_file;
pub use archive::import_report;
pub use archive::import_report_file;
pub use builder::DEFAULT_VALIDITY;
pub use builder::ReportBuilder;
pub use error::ReportError;
pub use error::SignatureError;
pub use report::CertifiedBy;
pub use report::Environment;
pub use report::MAX_CERTIFIED_FIELD_CHARS;
pub use report::Report;
pub use report::ReportStatus;
pub use report::SpecificationResults;
pub use signing::MAX_SIGNING_KEY_BYTES;
pub use signing::ReportClaims;
pub use signing::ReportDigests;
pub use signing::ReportSigner;
pub use signing::ReportVerifier;
pub use signing::SIGNING_ALGORITHM;
