// crates/fcs-runner/tests/version.rs
// ============================================================================
// Module: Version Check Tests
// Description: Sorts tag lists and checks a local tag server.
// Purpose: Confirm tolerant ordering and update detection.
// ============================================================================
//! ## Overview
//! The tag endpoint is served by a one-shot `tiny_http` server on loopback.

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

use std::thread::JoinHandle;

use fcs_config::HttpConfig;
use fcs_core::MemoryEventSink;
use fcs_runner::HttpTransport;
use fcs_runner::INSECURE_CONNECTION_EVENT;
use fcs_runner::RunnerError;
use fcs_runner::VersionChecker;
use fcs_runner::sort_tags;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serves one response and returns the tag URL.
fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let url = format!("http://{}/tags", server.server_addr());
    let handle = std::thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(Header::from_bytes("Content-Type", "application/json").unwrap());
            request.respond(response).expect("respond");
        }
    });
    (url, handle)
}

/// Returns a transport over default settings.
fn transport() -> HttpTransport {
    HttpTransport::from_config(&HttpConfig::default(), &MemoryEventSink::new()).unwrap()
}

/// Converts string literals into owned tags.
fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

// ============================================================================
// SECTION: Sorting
// ============================================================================

/// Tests equal versions keep their input order.
#[test]
fn equal_versions_keep_their_input_order() {
    assert_eq!(sort_tags(&tags(&["1.0", "2.0", "1.0.0", "v1.0"])), tags(&["1.0", "1.0.0", "v1.0", "2.0"]));
}

/// Tests unparseable tags are dropped.
#[test]
fn unparseable_tags_are_dropped() {
    assert_eq!(sort_tags(&tags(&["v1.2.0", "nightly", "v1.1.0"])), tags(&["v1.1.0", "v1.2.0"]));
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Tests newer tag reports an update.
#[test]
fn newer_tag_reports_an_update() {
    let status = VersionChecker::new("unused").with_current("1.2.0").compare(&tags(&["v1.1.0", "v1.3.0"])).unwrap();
    assert_eq!(status.latest.as_deref(), Some("v1.3.0"));
    assert!(status.update_available);
}

/// Tests same or older tags report no update.
#[test]
fn same_or_older_tags_report_no_update() {
    let checker = VersionChecker::new("unused").with_current("v1.2");
    assert!(!checker.compare(&tags(&["1.2.0", "1.0.0"])).unwrap().update_available);
    let empty = checker.compare(&[]).unwrap();
    assert_eq!(empty.latest, None);
    assert!(!empty.update_available);
}

/// Tests invalid local version is an error.
#[test]
fn invalid_local_version_is_an_error() {
    let err = VersionChecker::new("unused").with_current("dev").compare(&tags(&["1.0.0"])).unwrap_err();
    assert!(matches!(err, RunnerError::Version(message) if message.starts_with("dev: ")));
}

// ============================================================================
// SECTION: Fetching
// ============================================================================

/// Tests check fetches and compares tags.
#[test]
fn check_fetches_and_compares_tags() {
    let (url, handle) = serve_once(200, r#"[{"name":"v1.0.0"},{"name":"v2.0.0"},{"name":"latest"}]"#);
    let status = VersionChecker::new(url).with_current("1.5.0").check(&transport()).unwrap();
    handle.join().unwrap();
    assert_eq!(status.current, "1.5.0");
    assert_eq!(status.latest.as_deref(), Some("v2.0.0"));
    assert!(status.update_available);
}

/// Tests check rejects error statuses.
#[test]
fn check_rejects_error_statuses() {
    let (url, handle) = serve_once(503, "unavailable");
    let err = VersionChecker::new(url).check(&transport()).unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, RunnerError::Http(message) if message.contains("503")));
}

/// Tests check rejects malformed tag lists.
#[test]
fn check_rejects_malformed_tag_lists() {
    let (url, handle) = serve_once(200, r#"{"name":"v1.0.0"}"#);
    let err = VersionChecker::new(url).check(&transport()).unwrap_err();
    handle.join().unwrap();
    assert!(matches!(err, RunnerError::Version(message) if message.starts_with("invalid tag list")));
}

/// Tests insecure transport is recorded.
#[test]
fn insecure_transport_is_recorded() {
    let sink = MemoryEventSink::new();
    let config = HttpConfig {
        insecure_skip_verify: true,
        ..HttpConfig::default()
    };
    let transport = HttpTransport::from_config(&config, &sink).unwrap();
    assert!(transport.is_insecure());
    assert_eq!(sink.named(INSECURE_CONNECTION_EVENT).len(), 1);

    let verifying_sink = MemoryEventSink::new();
    let verifying = HttpConfig {
        insecure_skip_verify: false,
        ..HttpConfig::default()
    };
    let transport = HttpTransport::from_config(&verifying, &verifying_sink).unwrap();
    assert!(!transport.is_insecure());
    assert!(verifying_sink.named(INSECURE_CONNECTION_EVENT).is_empty());
}
