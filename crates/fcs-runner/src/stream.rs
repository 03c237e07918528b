// crates/fcs-runner/src/stream.rs
// ============================================================================
// Module: Result Stream Reader
// Description: Length-prefixed JSON message reader and handler chain.
// Purpose: Feed server-pushed results and end-of-run signals into channels.
// Dependencies: fcs-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! The execution server pushes frames of a 4-byte big-endian length followed
//! by a JSON object tagged by `type`. The reader decodes each frame and runs
//! it through a chain of [`MessageHandler`]s until one claims it. Handlers are
//! pure: they map a message to a [`Dispatch`] or an error, and the reader
//! performs the resulting channel sends.
//!
//! Invariants:
//! - Results are forwarded in arrival order.
//! - Every exit path of the reader sends exactly one [`StreamEnd`].
//! - Frames larger than [`MAX_FRAME_BYTES`] end the stream with a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::sync::Arc;

use fcs_core::EventSink;
use fcs_core::PipelineEvent;
use fcs_core::TestResult;
use serde_json::Value;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted frame payload in bytes.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Message type carrying one test result under `test`.
pub const RESULT_CASE_TYPE: &str = "resultCase";

/// Message type signalling that every test case finished.
pub const TEST_CASES_COMPLETED_TYPE: &str = "testCasesCompleted";

/// Message type carrying a server-side failure under `error`.
pub const ERROR_TYPE: &str = "error";

/// Message types that carry nothing for the aggregator.
pub const IGNORED_TYPES: [&str; 2] = ["pong", "tokenAcquired"];

/// Event emitted when the reader stops.
pub const RESULT_STREAM_CLOSED_EVENT: &str = "result_stream_closed";

/// Event emitted when a handler rejects a message.
pub const RESULT_HANDLER_FAILED_EVENT: &str = "result_handler_failed";

/// Event emitted when no handler claims a message.
pub const RESULT_MESSAGE_UNHANDLED_EVENT: &str = "result_message_unhandled";

/// Event emitted when nobody is left to receive the end token.
pub const RESULT_END_UNDELIVERED_EVENT: &str = "result_end_undelivered";

/// Subject used for stream events.
const STREAM_SUBJECT: &str = "result_stream";

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Decoded stream message.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamMessage {
    /// Value of the `type` field.
    pub kind: String,
    /// Whole message object.
    pub payload: Value,
}

impl StreamMessage {
    /// Decodes a frame payload.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Stream`] when the payload is not a JSON object
    /// with a string `type`.
    pub fn decode(bytes: &[u8]) -> Result<Self, RunnerError> {
        let payload: Value =
            serde_json::from_slice(bytes).map_err(|err| RunnerError::Stream(format!("invalid message: {err}")))?;
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RunnerError::Stream("message has no type".to_string()))?
            .to_string();
        Ok(Self {
            kind,
            payload,
        })
    }
}

/// What the reader should do with a claimed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Forward a result to the aggregator.
    Result(Box<TestResult>),
    /// The run finished.
    Completed,
    /// Nothing to forward.
    Ignored,
}

/// Terminal token sent on the `ended` channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server reported that every test case finished.
    Completed,
    /// The stream reached end of input.
    Closed,
    /// A handler or the framing failed.
    Failed(String),
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// One link of the handler chain.
pub trait MessageHandler: Send + Sync {
    /// Returns `Ok(None)` when the message belongs to another handler.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Handler`] when the message is claimed but unusable.
    fn handle(&self, message: &StreamMessage) -> Result<Option<Dispatch>, RunnerError>;
}

/// Claims `resultCase` messages.
pub struct ResultCaseHandler;

impl MessageHandler for ResultCaseHandler {
    fn handle(&self, message: &StreamMessage) -> Result<Option<Dispatch>, RunnerError> {
        if message.kind != RESULT_CASE_TYPE {
            return Ok(None);
        }
        let test = message
            .payload
            .get("test")
            .cloned()
            .ok_or_else(|| RunnerError::Handler("resultCase message has no test".to_string()))?;
        let result: TestResult =
            serde_json::from_value(test).map_err(|err| RunnerError::Handler(format!("invalid test result: {err}")))?;
        Ok(Some(Dispatch::Result(Box::new(result))))
    }
}

/// Claims `testCasesCompleted` messages.
pub struct CompletedHandler;

impl MessageHandler for CompletedHandler {
    fn handle(&self, message: &StreamMessage) -> Result<Option<Dispatch>, RunnerError> {
        Ok((message.kind == TEST_CASES_COMPLETED_TYPE).then_some(Dispatch::Completed))
    }
}

/// Turns `error` messages into handler failures.
pub struct ErrorHandler;

impl MessageHandler for ErrorHandler {
    fn handle(&self, message: &StreamMessage) -> Result<Option<Dispatch>, RunnerError> {
        if message.kind != ERROR_TYPE {
            return Ok(None);
        }
        let reason = match message.payload.get("error") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => "unspecified server error".to_string(),
        };
        Err(RunnerError::Handler(reason))
    }
}

/// Claims and drops keep-alive and token notifications.
pub struct IgnoreHandler;

impl MessageHandler for IgnoreHandler {
    fn handle(&self, message: &StreamMessage) -> Result<Option<Dispatch>, RunnerError> {
        Ok(IGNORED_TYPES.contains(&message.kind.as_str()).then_some(Dispatch::Ignored))
    }
}

/// Returns the standard handler chain.
#[must_use]
pub fn default_handlers() -> Vec<Box<dyn MessageHandler>> {
    vec![Box::new(ResultCaseHandler), Box::new(CompletedHandler), Box::new(ErrorHandler), Box::new(IgnoreHandler)]
}

// ============================================================================
// SECTION: Framing
// ============================================================================

/// Reads one frame; returns `None` at a clean end of input.
///
/// # Errors
///
/// Returns [`RunnerError::Stream`] for truncated or oversized frames.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>, RunnerError> {
    let mut prefix = [0_u8; 4];
    match reader.read_exact(&mut prefix).await {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(RunnerError::Stream(format!("frame read failed: {err}"))),
    }
    let length = usize::try_from(u32::from_be_bytes(prefix))
        .map_err(|_| RunnerError::Stream("frame length exceeds addressable size".to_string()))?;
    if length > MAX_FRAME_BYTES {
        return Err(RunnerError::Stream(format!("frame of {length} bytes exceeds {MAX_FRAME_BYTES}")));
    }
    let mut payload = vec![0_u8; length];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|err| RunnerError::Stream(format!("truncated frame: {err}")))?;
    Ok(Some(payload))
}

/// Encodes a payload as one frame.
///
/// # Errors
///
/// Returns [`RunnerError::Stream`] when the payload exceeds [`MAX_FRAME_BYTES`].
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, RunnerError> {
    if payload.len() > MAX_FRAME_BYTES {
        return Err(RunnerError::Stream(format!("frame of {} bytes exceeds {MAX_FRAME_BYTES}", payload.len())));
    }
    let length = u32::try_from(payload.len())
        .map_err(|_| RunnerError::Stream("frame length exceeds u32".to_string()))?;
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Writes one frame and flushes.
///
/// # Errors
///
/// Returns [`RunnerError::Stream`] on oversize payloads or write failure.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), RunnerError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await.map_err(|err| RunnerError::Stream(format!("frame write failed: {err}")))?;
    writer.flush().await.map_err(|err| RunnerError::Stream(format!("frame write failed: {err}")))
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Receiving halves handed to the aggregator.
#[derive(Debug)]
pub struct StreamChannels {
    /// Results in arrival order.
    pub results: mpsc::Receiver<TestResult>,
    /// Terminal token.
    pub ended: mpsc::Receiver<StreamEnd>,
}

/// Reads frames and dispatches them through the handler chain.
pub struct ResultStreamReader {
    /// Handlers tried in order.
    handlers: Vec<Box<dyn MessageHandler>>,
    /// Sink for stream events.
    events: Arc<dyn EventSink>,
}

impl ResultStreamReader {
    /// Creates a reader with the standard handler chain.
    #[must_use]
    pub fn new(events: Arc<dyn EventSink>) -> Self {
        Self::with_handlers(default_handlers(), events)
    }

    /// Creates a reader with a custom handler chain.
    #[must_use]
    pub fn with_handlers(handlers: Vec<Box<dyn MessageHandler>>, events: Arc<dyn EventSink>) -> Self {
        Self {
            handlers,
            events,
        }
    }

    /// Spawns the reader on the current runtime.
    ///
    /// `capacity` bounds the results channel; zero is raised to one.
    pub fn spawn<R>(self, reader: R, capacity: usize) -> (JoinHandle<()>, StreamChannels)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (results_tx, results) = mpsc::channel(capacity.max(1));
        let (ended_tx, ended) = mpsc::channel(1);
        let handle = tokio::spawn(self.run(reader, results_tx, ended_tx));
        (handle, StreamChannels {
            results,
            ended,
        })
    }

    /// Reads until end of input, completion or failure, then sends the end token.
    pub async fn run<R: AsyncRead + Unpin>(
        self,
        mut reader: R,
        results: mpsc::Sender<TestResult>,
        ended: mpsc::Sender<StreamEnd>,
    ) {
        let end = loop {
            let frame = match read_frame(&mut reader).await {
                Ok(Some(frame)) => frame,
                Ok(None) => break StreamEnd::Closed,
                Err(err) => break self.failed(&err),
            };
            match self.dispatch(&frame) {
                Ok(Dispatch::Result(result)) => {
                    if results.send(*result).await.is_err() {
                        break StreamEnd::Closed;
                    }
                }
                Ok(Dispatch::Completed) => break StreamEnd::Completed,
                Ok(Dispatch::Ignored) => {}
                Err(err) => break self.failed(&err),
            }
        };
        let reason = match &end {
            StreamEnd::Completed => "test cases completed",
            StreamEnd::Closed => "end of stream",
            StreamEnd::Failed(_) => "stream failed",
        };
        self.events.record(&PipelineEvent::info(RESULT_STREAM_CLOSED_EVENT, STREAM_SUBJECT, reason));
        if ended.send(end).await.is_err() {
            self.events.record(&PipelineEvent::warn(
                RESULT_END_UNDELIVERED_EVENT,
                STREAM_SUBJECT,
                format!("end token ({reason}) not delivered: aggregator is gone"),
            ));
        }
    }

    /// Runs one frame through the handler chain.
    fn dispatch(&self, frame: &[u8]) -> Result<Dispatch, RunnerError> {
        let message = StreamMessage::decode(frame)?;
        for handler in &self.handlers {
            if let Some(dispatch) = handler.handle(&message)? {
                return Ok(dispatch);
            }
        }
        self.events.record(&PipelineEvent::warn(
            RESULT_MESSAGE_UNHANDLED_EVENT,
            STREAM_SUBJECT,
            format!("no handler for message type {}", message.kind),
        ));
        Ok(Dispatch::Ignored)
    }

    /// Records a failure and builds its end token.
    fn failed(&self, err: &RunnerError) -> StreamEnd {
        self.events.record(&PipelineEvent::error(RESULT_HANDLER_FAILED_EVENT, STREAM_SUBJECT, err.to_string()));
        match err {
            RunnerError::Handler(reason) => StreamEnd::Failed(reason.clone()),
            other => StreamEnd::Failed(other.to_string()),
        }
    }
}
