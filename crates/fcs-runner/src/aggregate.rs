// crates/fcs-runner/src/aggregate.rs
// ============================================================================
// Module: Result Aggregator
// Description: Collects streamed results until the run ends or times out.
// Purpose: Bound how long a journey waits for the execution server.
// Dependencies: fcs-core, tokio
// ============================================================================

//! ## Overview
//! The aggregator waits on three sources at once: the results channel, the
//! `ended` channel and a deadline. Results are kept in arrival order. When the
//! end token arrives, results already queued are drained before returning so
//! a late `ended` never drops a result. The deadline ends collection with
//! [`RunnerError::Timeout`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use fcs_core::TestResult;
use tokio::time::Instant;

use crate::error::RunnerError;
use crate::stream::StreamChannels;
use crate::stream::StreamEnd;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default collection deadline (five minutes).
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Collects results from a [`StreamChannels`] pair.
#[derive(Debug, Clone, Copy)]
pub struct ResultAggregator {
    /// Time allowed for the whole run.
    timeout: Duration,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_RUN_TIMEOUT)
    }
}

impl ResultAggregator {
    /// Creates an aggregator with the given deadline.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
        }
    }

    /// Returns the configured deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Collects results until the stream ends.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Timeout`] when the deadline elapses first and
    /// [`RunnerError::Handler`] when the stream ended with a failure.
    pub async fn collect(&self, channels: StreamChannels) -> Result<Vec<TestResult>, RunnerError> {
        let StreamChannels {
            mut results,
            mut ended,
        } = channels;
        let deadline = tokio::time::sleep_until(Instant::now() + self.timeout);
        tokio::pin!(deadline);

        let mut collected = Vec::new();
        let end = loop {
            tokio::select! {
                biased;
                Some(result) = results.recv() => collected.push(result),
                end = ended.recv() => break end.unwrap_or(StreamEnd::Closed),
                () = &mut deadline => return Err(RunnerError::Timeout),
            }
        };
        while let Ok(result) = results.try_recv() {
            collected.push(result);
        }
        match end {
            StreamEnd::Completed | StreamEnd::Closed => Ok(collected),
            StreamEnd::Failed(reason) => Err(RunnerError::Handler(reason)),
        }
    }
}
