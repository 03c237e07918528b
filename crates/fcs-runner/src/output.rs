// crates/fcs-runner/src/output.rs
// ============================================================================
// Module: Result Output
// Description: Line-oriented rendering of test results.
// Purpose: Give operators a stable pass/fail listing and exit decision.
// Dependencies: fcs-core
// ============================================================================

//! ## Overview
//! Each result renders as `=== PASS: <id>` or `=== FAIL: <id>`; a failing
//! result is followed by one indented line per reason.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;

use fcs_core::TestResult;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Writes every result in order.
///
/// # Errors
///
/// Returns the first write error.
pub fn write_results<W: Write>(writer: &mut W, results: &[TestResult]) -> io::Result<()> {
    for result in results {
        if result.pass {
            writeln!(writer, "=== PASS: {}", result.id)?;
            continue;
        }
        writeln!(writer, "=== FAIL: {}", result.id)?;
        for reason in &result.fail {
            writeln!(writer, "\t{reason}")?;
        }
    }
    writer.flush()
}

/// Returns true when every result passed.
#[must_use]
pub fn all_passed(results: &[TestResult]) -> bool {
    results.iter().all(|result| result.pass)
}
