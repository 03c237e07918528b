// crates/fcs-report/src/builder.rs
// ============================================================================
// Module: Report Builder
// Description: Assembles a validated report from a finished run.
// Purpose: Stamp identity, timestamps and status onto run results.
// Dependencies: fcs-core, time, uuid
// ============================================================================

//! ## Overview
//! The builder assigns a fresh UUIDv4, formats `created` from the supplied
//! clock reading, derives `expiration` as `created + validity`, and sets the
//! status to `Complete` when every result passed, `Error` when any failed, and
//! `Pending` when nothing ran yet. Built reports are validated before they
//! are returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use fcs_core::DiscoveryModel;
use time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::error::ReportError;
use crate::report::CertifiedBy;
use crate::report::Report;
use crate::report::ReportStatus;
use crate::report::SpecificationResults;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default report validity (60 days).
pub const DEFAULT_VALIDITY: Duration = Duration::days(60);

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds reports for one suite version and certification.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    /// Suite version recorded in every report.
    version: String,
    /// Certification details.
    certified_by: CertifiedBy,
    /// Time between creation and expiry.
    validity: Duration,
}

impl ReportBuilder {
    /// Creates a builder with the default validity.
    #[must_use]
    pub fn new(version: impl Into<String>, certified_by: CertifiedBy) -> Self {
        Self {
            version: version.into(),
            certified_by,
            validity: DEFAULT_VALIDITY,
        }
    }

    /// Overrides the report validity.
    #[must_use]
    pub const fn with_validity(mut self, validity: Duration) -> Self {
        self.validity = validity;
        self
    }

    /// Builds and validates a report created at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialize`] when a timestamp cannot be
    /// formatted, [`ReportError::Invalid`] when the expiry overflows or the
    /// certification fails validation.
    pub fn build(
        &self,
        discovery: &DiscoveryModel,
        specifications: Vec<SpecificationResults>,
        now: OffsetDateTime,
    ) -> Result<Report, ReportError> {
        let expires = now
            .checked_add(self.validity)
            .ok_or_else(|| ReportError::Invalid("expiration: out of range.".to_string()))?;
        let status = if specifications.iter().all(|spec| spec.results.is_empty()) {
            ReportStatus::Pending
        } else if specifications.iter().all(SpecificationResults::all_passed) {
            ReportStatus::Complete
        } else {
            ReportStatus::Error
        };
        let report = Report {
            id: Uuid::new_v4().to_string(),
            created: format_timestamp(now)?,
            expiration: Some(format_timestamp(expires)?),
            version: self.version.clone(),
            status,
            certified_by: self.certified_by.clone(),
            discovery: discovery.clone(),
            api_specifications: specifications,
        };
        report.validate()?;
        Ok(report)
    }
}

/// Formats a timestamp as RFC 3339.
fn format_timestamp(value: OffsetDateTime) -> Result<String, ReportError> {
    value.format(&Rfc3339).map_err(|err| ReportError::Serialize(err.to_string()))
}
