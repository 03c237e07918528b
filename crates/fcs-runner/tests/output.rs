// crates/fcs-runner/tests/output.rs
// ============================================================================
// Module: Result Output Tests
// Description: Renders result lists to an in-memory buffer.
// Purpose: Confirm the PASS/FAIL line format and the overall verdict.
// ============================================================================
//! ## Overview
//! Output is written to a `Vec<u8>` and compared as text.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use fcs_core::TestCaseId;
use fcs_core::TestResult;
use fcs_runner::all_passed;
use fcs_runner::write_results;

#[test]
fn failures_list_each_reason_indented() {
    let results = vec![
        TestResult::passed(TestCaseId::new("OB-301-ACC-100100")),
        TestResult::failed(
            TestCaseId::new("OB-301-ACC-100200"),
            vec!["status code 500 does not equal expected 200".to_string(), ".Data in body is required".to_string()],
        ),
    ];
    let mut buffer = Vec::new();
    write_results(&mut buffer, &results).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert_eq!(
        text,
        "=== PASS: OB-301-ACC-100100\n=== FAIL: OB-301-ACC-100200\n\tstatus code 500 does not equal expected 200\n\t.Data in body is required\n"
    );
    assert!(!all_passed(&results));
}

#[test]
fn empty_run_writes_nothing_and_passes() {
    let mut buffer = Vec::new();
    write_results(&mut buffer, &[]).unwrap();
    assert!(buffer.is_empty());
    assert!(all_passed(&[]));
}
