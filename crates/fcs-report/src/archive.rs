// crates/fcs-report/src/archive.rs
// ============================================================================
// Module: Report Archive
// Description: ZIP packaging of reports as a single `report.json` member.
// Purpose: Export validated reports and read them back.
// Dependencies: serde_json, zip
// ============================================================================

//! ## Overview
//! An archive holds exactly one deflated member, `report.json`, containing
//! the report as JSON indented by two spaces. Export validates first and
//! never writes an invalid report. Import reads the whole input (bounded by
//! [`MAX_ARCHIVE_BYTES`]), locates the member by name and decodes it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::Cursor;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::error::ReportError;
use crate::report::Report;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the single archive member.
pub const REPORT_ENTRY: &str = "report.json";

/// Maximum accepted archive or member size in bytes.
pub const MAX_ARCHIVE_BYTES: u64 = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Export
// ============================================================================

/// Validates `report` and returns the archive bytes.
///
/// # Errors
///
/// Returns [`ReportError::Invalid`] for invalid reports,
/// [`ReportError::Serialize`] when encoding fails and
/// [`ReportError::Archive`] when the container cannot be written.
pub fn archive_bytes(report: &Report) -> Result<Vec<u8>, ReportError> {
    report.validate()?;
    let json = serde_json::to_vec_pretty(report).map_err(|err| ReportError::Serialize(err.to_string()))?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(REPORT_ENTRY, options).map_err(|err| ReportError::Archive(err.to_string()))?;
    writer.write_all(&json).map_err(|err| ReportError::Io(err.to_string()))?;
    let cursor = writer.finish().map_err(|err| ReportError::Archive(err.to_string()))?;
    Ok(cursor.into_inner())
}

/// Writes the archive for `report` to `writer`.
///
/// # Errors
///
/// Returns [`archive_bytes`] errors and [`ReportError::Io`] on write failure.
pub fn export_report<W: Write>(report: &Report, mut writer: W) -> Result<(), ReportError> {
    let bytes = archive_bytes(report)?;
    writer.write_all(&bytes).map_err(|err| ReportError::Io(err.to_string()))?;
    writer.flush().map_err(|err| ReportError::Io(err.to_string()))
}

/// Writes the archive for `report` to `path`.
///
/// # Errors
///
/// Returns [`archive_bytes`] errors and [`ReportError::Io`] on write failure.
pub fn export_report_file(report: &Report, path: &Path) -> Result<(), ReportError> {
    let bytes = archive_bytes(report)?;
    fs::write(path, bytes).map_err(|err| ReportError::Io(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: Import
// ============================================================================

/// Reads an archive until EOF and decodes its report.
///
/// # Errors
///
/// Returns [`ReportError::Io`] on read failure or oversize input,
/// [`ReportError::Archive`] for unreadable containers,
/// [`ReportError::MissingEntry`] when `report.json` is absent and
/// [`ReportError::Serialize`] when the member is not a report.
pub fn import_report<R: Read>(reader: R) -> Result<Report, ReportError> {
    let bytes = read_limited(reader)?;
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|err| ReportError::Archive(err.to_string()))?;
    let entry = match archive.by_name(REPORT_ENTRY) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Err(ReportError::MissingEntry(REPORT_ENTRY.to_string())),
        Err(err) => return Err(ReportError::Archive(err.to_string())),
    };
    if entry.size() > MAX_ARCHIVE_BYTES {
        return Err(ReportError::Io(format!("{REPORT_ENTRY} exceeds {MAX_ARCHIVE_BYTES} bytes")));
    }
    let json = read_limited(entry)?;
    serde_json::from_slice(&json).map_err(|err| ReportError::Serialize(err.to_string()))
}

/// Reads and decodes the archive at `path`.
///
/// # Errors
///
/// Returns [`ReportError::Io`] when the file cannot be opened and
/// [`import_report`] errors otherwise.
pub fn import_report_file(path: &Path) -> Result<Report, ReportError> {
    let file = File::open(path).map_err(|err| ReportError::Io(format!("{}: {err}", path.display())))?;
    import_report(file)
}

/// Reads at most [`MAX_ARCHIVE_BYTES`] from `reader`.
fn read_limited<R: Read>(reader: R) -> Result<Vec<u8>, ReportError> {
    let mut bytes = Vec::new();
    reader
        .take(MAX_ARCHIVE_BYTES.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|err| ReportError::Io(err.to_string()))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_ARCHIVE_BYTES {
        return Err(ReportError::Io(format!("archive exceeds {MAX_ARCHIVE_BYTES} bytes")));
    }
    Ok(bytes)
}
