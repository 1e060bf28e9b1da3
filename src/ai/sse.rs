//! Server-Sent Events (SSE) parser for chat-completion streaming responses.
//!
//! This module provides a line-oriented SSE parser that handles:
//! - Lines split across network chunks
//! - Multiple lines in one read
//! - Comments, blank lines and non-`data:` fields (ignored)
//! - JSON payloads cut short by a stray line break (held back and retried)
//!
//! Each `data:` payload is a chat-completion chunk whose text lives at
//! `choices[0].delta.content`.

use serde_json::Value;
use tracing::{debug, warn};

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Upper bound for a held-back JSON fragment before it is given up on.
const MAX_PENDING_PAYLOAD: usize = 256 * 1024;

/// One decoded SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// Non-empty text extracted from `choices[0].delta.content`.
    Delta(String),
    /// The `[DONE]` terminator.
    Done,
}

/// Outcome of parsing one `data:` payload.
enum Payload {
    Frame(Option<StreamFrame>),
    /// Valid JSON prefix that ended early; wait for the rest.
    Incomplete(String),
    Malformed(serde_json::Error),
}

/// Stateful SSE parser that buffers incomplete lines across chunk boundaries.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Text received after the last newline.
    buffer: String,
    /// A `data:` payload that failed to parse because it ended too early.
    pending_payload: Option<String>,
    finished: bool,
}

impl SseParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of decoded text and returns every frame completed by it.
    ///
    /// Only complete lines are processed; a trailing partial line stays
    /// buffered. Nothing is returned once `[DONE]` has been seen.
    pub fn feed(&mut self, chunk: &str) -> Vec<StreamFrame> {
        if self.finished {
            return Vec::new();
        }
        self.buffer.push_str(chunk);

        let mut frames = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline).collect();
            let line = line.strip_suffix('\n').unwrap_or(&line);

            if let Some(frame) = self.process_line(line) {
                let done = frame == StreamFrame::Done;
                frames.push(frame);
                if done {
                    self.finished = true;
                    self.buffer.clear();
                    break;
                }
            }
        }

        frames
    }

    /// Flushes the final unterminated line when the byte stream ends.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let line = std::mem::take(&mut self.buffer);
        let frames: Vec<StreamFrame> = self.process_line(&line).into_iter().collect();

        if let Some(fragment) = self.pending_payload.take() {
            warn!(
                fragment_len = fragment.len(),
                "Chat stream ended inside an incomplete JSON payload; dropping it"
            );
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<StreamFrame> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let starts_event = line.is_empty() || line.starts_with(':') || line.starts_with(DATA_PREFIX);

        if let Some(mut fragment) = self.pending_payload.take() {
            if !starts_event {
                fragment.push('\n');
                fragment.push_str(line);
                return self.resolve_payload(fragment);
            }
            warn!(
                fragment_len = fragment.len(),
                "Dropping malformed chat stream payload"
            );
        }

        if line.trim().is_empty() || line.starts_with(':') {
            return None;
        }

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            debug!(line_len = line.len(), "Ignoring non-data SSE line");
            return None;
        };

        let payload = payload.trim();
        if payload == DONE_SENTINEL {
            return Some(StreamFrame::Done);
        }

        self.resolve_payload(payload.to_string())
    }

    fn resolve_payload(&mut self, payload: String) -> Option<StreamFrame> {
        match parse_payload(payload) {
            Payload::Frame(frame) => frame,
            Payload::Incomplete(fragment) => {
                if fragment.len() > MAX_PENDING_PAYLOAD {
                    warn!(
                        fragment_len = fragment.len(),
                        "Incomplete chat stream payload exceeded limit; dropping it"
                    );
                } else {
                    self.pending_payload = Some(fragment);
                }
                None
            }
            Payload::Malformed(e) => {
                warn!(error = %e, "Dropping malformed chat stream payload");
                None
            }
        }
    }

    /// Returns any remaining buffered data (for debugging/testing).
    #[must_use]
    pub fn remaining_buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

fn parse_payload(payload: String) -> Payload {
    match serde_json::from_str::<Value>(&payload) {
        Ok(json) => Payload::Frame(
            extract_delta(&json)
                .filter(|d| !d.is_empty())
                .map(|d| StreamFrame::Delta(d.to_string())),
        ),
        Err(e) if e.is_eof() => Payload::Incomplete(payload),
        Err(e) => Payload::Malformed(e),
    }
}

/// Reads `choices[0].delta.content`.
fn extract_delta(json: &Value) -> Option<&str> {
    json.get("choices")?
        .get(0)?
        .get("delta")?
        .get("content")?
        .as_str()
}
