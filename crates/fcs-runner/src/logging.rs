// crates/fcs-runner/src/logging.rs
// ============================================================================
// Module: Event Sink Selection
// Description: Builds the pipeline event sink named by configuration.
// Purpose: Route structured events to stderr, a file, or nowhere.
// Dependencies: fcs-config, fcs-core
// ============================================================================

//! ## Overview
//! Maps [`LoggingConfig`] onto one of the core event sinks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::Arc;

use fcs_config::LogSink;
use fcs_config::LoggingConfig;
use fcs_core::EventSink;
use fcs_core::FileEventSink;
use fcs_core::NoopEventSink;
use fcs_core::StderrEventSink;

// ============================================================================
// SECTION: Sink Selection
// ============================================================================

/// Builds the configured event sink.
///
/// # Errors
///
/// Returns an I/O error when the file sink cannot be opened or has no path.
pub fn event_sink(config: &LoggingConfig) -> io::Result<Arc<dyn EventSink>> {
    match config.sink {
        LogSink::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSink::None => Ok(Arc::new(NoopEventSink)),
        LogSink::File => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "logging.path is required"))?;
            Ok(Arc::new(FileEventSink::new(Path::new(path))?))
        }
    }
}
