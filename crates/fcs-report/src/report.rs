// crates/fcs-report/src/report.rs
// ============================================================================
// Module: Report Model
// Description: Conformance report structure, enum tables and validation.
// Purpose: Define the exported report and reject incomplete reports before write.
// Dependencies: fcs-core, serde, time, uuid
// ============================================================================

//! ## Overview
//! [`ReportStatus`] and [`Environment`] serialize through explicit name tables
//! as quoted JSON strings. Decoding accepts either the table name or its
//! numeric position; anything else is rejected with
//! `"S" is an invalid enum for <Enum>` or `N is an invalid enum for <Enum>`.
//!
//! [`Report::validate`] collects every field problem and reports them in one
//! message ordered by field name, for example
//! `agreedTermsConditions: cannot be blank.`

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use fcs_core::DiscoveryModel;
use fcs_core::TestResult;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::de::Visitor;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;
use uuid::Version;

use crate::error::ReportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum characters accepted in each certification string field.
pub const MAX_CERTIFIED_FIELD_CHARS: usize = 60;

/// Message for a required field left empty.
const BLANK: &str = "cannot be blank";

// ============================================================================
// SECTION: Enum Tables
// ============================================================================

/// Report status table; position is the numeric code.
const STATUS_TABLE: [(ReportStatus, &str); 3] = [
    (ReportStatus::Pending, "Pending"),
    (ReportStatus::Complete, "Complete"),
    (ReportStatus::Error, "Error"),
];

/// Environment table; position is the numeric code.
const ENVIRONMENT_TABLE: [(Environment, &str); 3] = [
    (Environment::Testing, "Testing"),
    (Environment::Sandbox, "Sandbox"),
    (Environment::Production, "Production"),
];

/// Enum backed by a static name table.
trait TableEnum: Copy + PartialEq + Sized + 'static {
    /// Name used in error messages.
    const ENUM: &'static str;

    /// Variants in code order with their serialized names.
    fn table() -> &'static [(Self, &'static str)];

    /// Resolves a serialized name.
    fn from_name(name: &str) -> Result<Self, ReportError> {
        Self::table()
            .iter()
            .find(|(_, candidate)| *candidate == name)
            .map(|(variant, _)| *variant)
            .ok_or_else(|| ReportError::InvalidEnum(format!("\"{name}\" is an invalid enum for {}", Self::ENUM)))
    }

    /// Resolves a numeric code.
    fn from_code(code: u64) -> Result<Self, ReportError> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::table().get(index))
            .map(|(variant, _)| *variant)
            .ok_or_else(|| ReportError::InvalidEnum(format!("{code} is an invalid enum for {}", Self::ENUM)))
    }

    /// Returns the serialized name.
    fn name(self) -> &'static str {
        Self::table().iter().find(|(variant, _)| *variant == self).map_or("", |(_, name)| name)
    }
}

/// Visitor decoding a table enum from a string or numeric code.
struct TableVisitor<T>(PhantomData<T>);

impl<T: TableEnum> Visitor<'_> for TableVisitor<T> {
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "a {} name or code", T::ENUM)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<T, E> {
        T::from_name(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<T, E> {
        T::from_code(value).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<T, E> {
        match u64::try_from(value) {
            Ok(code) => T::from_code(code).map_err(E::custom),
            Err(_) => Err(E::custom(format!("{value} is an invalid enum for {}", T::ENUM))),
        }
    }
}

// ============================================================================
// SECTION: Status
// ============================================================================

/// Overall report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportStatus {
    /// The run has not finished.
    Pending,
    /// Every test case passed.
    Complete,
    /// At least one test case failed.
    Error,
}

impl TableEnum for ReportStatus {
    const ENUM: &'static str = "Status";

    fn table() -> &'static [(Self, &'static str)] {
        &STATUS_TABLE
    }
}

impl ReportStatus {
    /// Returns the serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.name()
    }

    /// Resolves a numeric status code.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidEnum`] for codes outside the table.
    pub fn from_code(code: u64) -> Result<Self, ReportError> {
        <Self as TableEnum>::from_code(code)
    }

    /// Resolves a status name.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidEnum`] for names outside the table.
    pub fn from_name(name: &str) -> Result<Self, ReportError> {
        <Self as TableEnum>::from_name(name)
    }
}

impl Serialize for ReportStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ReportStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TableVisitor(PhantomData))
    }
}

// ============================================================================
// SECTION: Environment
// ============================================================================

/// Environment the suite ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Internal testing environment.
    Testing,
    /// Bank sandbox.
    Sandbox,
    /// Live production environment.
    Production,
}

impl TableEnum for Environment {
    const ENUM: &'static str = "Environment";

    fn table() -> &'static [(Self, &'static str)] {
        &ENVIRONMENT_TABLE
    }
}

impl Environment {
    /// Returns the serialized name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.name()
    }

    /// Resolves a numeric environment code.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidEnum`] for codes outside the table.
    pub fn from_code(code: u64) -> Result<Self, ReportError> {
        <Self as TableEnum>::from_code(code)
    }

    /// Resolves an environment name.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidEnum`] for names outside the table.
    pub fn from_name(name: &str) -> Result<Self, ReportError> {
        <Self as TableEnum>::from_name(name)
    }
}

impl Serialize for Environment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TableVisitor(PhantomData))
    }
}

// ============================================================================
// SECTION: Report
// ============================================================================

/// Who certified the run and where it ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifiedBy {
    /// Environment the suite ran against.
    pub environment: Environment,
    /// Brand under test.
    pub brand: String,
    /// Person authorising the submission.
    pub authorised_by: String,
    /// Job title of the authorising person.
    pub job_title: String,
    /// Whether the terms and conditions were accepted.
    #[serde(default)]
    pub agreed_terms_conditions: bool,
}

/// Results for one API specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificationResults {
    /// Specification name.
    pub name: String,
    /// Specification version.
    pub version: String,
    /// Schema document URL.
    #[serde(default)]
    pub schema_url: String,
    /// Per test-case results in execution order.
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl SpecificationResults {
    /// Returns true when every result passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|result| result.pass)
    }
}

/// Exported conformance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// UUIDv4 report identifier.
    pub id: String,
    /// RFC 3339 creation time.
    pub created: String,
    /// RFC 3339 expiry time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    /// Suite version that produced the report.
    pub version: String,
    /// Overall status.
    pub status: ReportStatus,
    /// Certification details.
    pub certified_by: CertifiedBy,
    /// Discovery model the run was planned from.
    pub discovery: DiscoveryModel,
    /// Results grouped by specification.
    #[serde(default)]
    pub api_specifications: Vec<SpecificationResults>,
}

impl Report {
    /// Validates every field, reporting all problems at once.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] with `field: message` pairs joined by
    /// `; ` and terminated by a period.
    pub fn validate(&self) -> Result<(), ReportError> {
        let mut findings: BTreeMap<&'static str, String> = BTreeMap::new();

        if self.id.trim().is_empty() {
            findings.insert("id", BLANK.to_string());
        } else if !is_uuid_v4(&self.id) {
            findings.insert("id", "must be a valid UUID v4".to_string());
        }
        if self.created.trim().is_empty() {
            findings.insert("created", BLANK.to_string());
        } else if !is_rfc3339(&self.created) {
            findings.insert("created", "must be a valid RFC 3339 date".to_string());
        }
        if let Some(expiration) = &self.expiration
            && !is_rfc3339(expiration)
        {
            findings.insert("expiration", "must be a valid RFC 3339 date".to_string());
        }
        if self.version.trim().is_empty() {
            findings.insert("version", BLANK.to_string());
        }

        let certified = &self.certified_by;
        for (field, value) in [
            ("brand", certified.brand.as_str()),
            ("authorisedBy", certified.authorised_by.as_str()),
            ("jobTitle", certified.job_title.as_str()),
        ] {
            if let Some(message) = length_finding(value) {
                findings.insert(field, message);
            }
        }
        if certified.environment == Environment::Production && !certified.agreed_terms_conditions {
            findings.insert("agreedTermsConditions", BLANK.to_string());
        }

        if findings.is_empty() {
            return Ok(());
        }
        let joined: Vec<String> = findings.iter().map(|(field, message)| format!("{field}: {message}")).collect();
        Err(ReportError::Invalid(format!("{}.", joined.join("; "))))
    }

    /// Returns true when every specification passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.api_specifications.iter().all(SpecificationResults::all_passed)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for a parseable UUID of version 4.
fn is_uuid_v4(value: &str) -> bool {
    Uuid::parse_str(value).is_ok_and(|id| id.get_version() == Some(Version::Random))
}

/// Returns true for an RFC 3339 timestamp.
fn is_rfc3339(value: &str) -> bool {
    OffsetDateTime::parse(value, &Rfc3339).is_ok()
}

/// Checks a certification string against the length bounds.
fn length_finding(value: &str) -> Option<String> {
    let length = value.chars().count();
    if value.trim().is_empty() {
        Some(BLANK.to_string())
    } else if length > MAX_CERTIFIED_FIELD_CHARS {
        Some(format!("the length must be between 1 and {MAX_CERTIFIED_FIELD_CHARS}"))
    } else {
        None
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
