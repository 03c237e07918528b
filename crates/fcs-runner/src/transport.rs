// crates/fcs-runner/src/transport.rs
// ============================================================================
// Module: Upstream HTTP Transport
// Description: Blocking HTTP clients for calls the runner makes itself.
// Purpose: Build timeout-bounded clients and surface the insecure-TLS sentinel.
// Dependencies: fcs-config, fcs-core, reqwest
// ============================================================================

//! ## Overview
//! The transport carries two clients: a short one for ordinary requests and a
//! long one for slow endpoints. Redirects are never followed. When the
//! configuration disables certificate verification, both clients accept any
//! certificate and an `insecure_connection` warning is recorded once, at
//! construction, so the posture is visible to the operator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use fcs_config::HttpConfig;
use fcs_core::EventSink;
use fcs_core::PipelineEvent;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Event recorded when TLS verification is disabled.
pub const INSECURE_CONNECTION_EVENT: &str = "insecure_connection";

/// Maximum accepted response body in bytes.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Pair of configured HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Client for ordinary requests.
    client: Client,
    /// Client for slow requests.
    long_client: Client,
    /// True when certificate verification is disabled.
    insecure: bool,
}

impl HttpTransport {
    /// Builds both clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Http`] when a client cannot be constructed.
    pub fn from_config(config: &HttpConfig, events: &dyn EventSink) -> Result<Self, RunnerError> {
        let insecure = config.insecure_skip_verify;
        let client = build_client(config.request_timeout(), insecure)?;
        let long_client = build_client(config.long_timeout(), insecure)?;
        if insecure {
            events.record(&PipelineEvent::warn(
                INSECURE_CONNECTION_EVENT,
                "http",
                "TLS certificate verification is disabled for upstream connections",
            ));
        }
        Ok(Self {
            client,
            long_client,
            insecure,
        })
    }

    /// Returns the client for ordinary requests.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Returns the client for slow requests.
    #[must_use]
    pub const fn long_client(&self) -> &Client {
        &self.long_client
    }

    /// Returns true when certificate verification is disabled.
    #[must_use]
    pub const fn is_insecure(&self) -> bool {
        self.insecure
    }

    /// Fetches `url` with the ordinary client and returns the body.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Http`] on transport failure, non-success status
    /// or a body larger than [`MAX_RESPONSE_BYTES`].
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RunnerError> {
        let response = self.client.get(url).send().map_err(|err| RunnerError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(RunnerError::Http(format!("http status {}", response.status())));
        }
        let limit = u64::try_from(MAX_RESPONSE_BYTES).unwrap_or(u64::MAX).saturating_add(1);
        let mut bytes = Vec::new();
        response.take(limit).read_to_end(&mut bytes).map_err(|err| RunnerError::Http(err.to_string()))?;
        if bytes.len() > MAX_RESPONSE_BYTES {
            return Err(RunnerError::Http(format!("response exceeds {MAX_RESPONSE_BYTES} bytes")));
        }
        Ok(bytes)
    }
}

/// Builds one client with the given timeout.
///
/// # Errors
///
/// Returns [`RunnerError::Http`] when the client cannot be constructed.
pub fn build_client(timeout: Duration, insecure: bool) -> Result<Client, RunnerError> {
    Client::builder()
        .redirect(Policy::none())
        .timeout(timeout)
        .danger_accept_invalid_certs(insecure)
        .build()
        .map_err(|err| RunnerError::Http(err.to_string()))
}
