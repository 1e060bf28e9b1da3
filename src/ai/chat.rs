//! Streaming chat client.
//!
//! Sends the full conversation to the chat endpoint and decodes the SSE
//! response into snapshots of the assistant text accumulated so far.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use std::collections::VecDeque;
use std::pin::Pin;
use tracing::{debug, error, info};

use super::error_message_from_body;
use super::sse::{SseParser, StreamFrame};
use crate::core::config::EndpointConfig;
use crate::core::models::{ChatMessage, ConversationTurn};
use crate::errors::{DEFAULT_CHAT_FAILURE, StudioError};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
}

/// Client for the streaming chat-completion endpoint.
///
/// The server keeps no state between calls, so every request carries the
/// whole history.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    endpoint: EndpointConfig,
}

impl ChatClient {
    #[must_use]
    pub fn new(http: Client, endpoint: EndpointConfig) -> Self {
        Self { http, endpoint }
    }

    /// Opens a streamed completion for `history` followed by `new_turn`.
    ///
    /// # Errors
    ///
    /// - `MissingCredential` if no API key is configured
    /// - `ChatRequestFailed` on a non-2xx status
    /// - `HttpError` if the request cannot be sent
    #[tracing::instrument(level = "info", skip_all, fields(turns = history.len() + 1))]
    pub async fn send(
        &self,
        history: &[ConversationTurn],
        new_turn: &ConversationTurn,
    ) -> Result<ChatStream, StudioError> {
        let auth = self.endpoint.bearer()?;

        let body = ChatRequest {
            messages: history
                .iter()
                .chain(std::iter::once(new_turn))
                .map(ChatMessage::from)
                .collect(),
        };

        #[cfg(feature = "debug-logs")]
        debug!("Chat request body: {:?}", body);

        let response = self
            .http
            .post(self.endpoint.url.clone())
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| StudioError::HttpError(format!("Chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, "Chat endpoint returned an error");
            return Err(StudioError::ChatRequestFailed {
                status: status.as_u16(),
                message: error_message_from_body(&error_text)
                    .unwrap_or_else(|| DEFAULT_CHAT_FAILURE.to_string()),
            });
        }

        info!(status = %status, "Chat stream opened");
        Ok(ChatStream::from_byte_stream(Box::pin(response.bytes_stream())))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// An open chat response being decoded.
///
/// Dropping the value closes the underlying connection, which is how a
/// caller aborts the decode loop.
pub struct ChatStream {
    byte_stream: ByteStream,
    parser: SseParser,
    pending_frames: VecDeque<StreamFrame>,
    utf8_buffer: Vec<u8>,
    accumulated: String,
    received_bytes: bool,
    exhausted: bool,
    completed: bool,
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("completed", &self.completed)
            .field("exhausted", &self.exhausted)
            .field("accumulated_len", &self.accumulated.len())
            .field("pending_frames_len", &self.pending_frames.len())
            .field("utf8_buffer_len", &self.utf8_buffer.len())
            .field("parser_buffer_len", &self.parser.remaining_buffer().len())
            .finish_non_exhaustive()
    }
}

impl ChatStream {
    pub(crate) fn from_byte_stream(byte_stream: ByteStream) -> Self {
        Self {
            byte_stream,
            parser: SseParser::new(),
            pending_frames: VecDeque::new(),
            utf8_buffer: Vec::new(),
            accumulated: String::new(),
            received_bytes: false,
            exhausted: false,
            completed: false,
        }
    }

    /// Returns the full text accumulated after the next delta, or `None`
    /// once the server has finished.
    ///
    /// # Errors
    ///
    /// - `ChatStreamUnavailable` if the response ends without any body
    /// - `HttpError` if reading the body fails mid-stream
    /// - `DecodeError` on invalid UTF-8
    pub async fn next_snapshot(&mut self) -> Result<Option<String>, StudioError> {
        loop {
            while let Some(frame) = self.pending_frames.pop_front() {
                match frame {
                    StreamFrame::Delta(delta) => {
                        self.accumulated.push_str(&delta);
                        return Ok(Some(self.accumulated.clone()));
                    }
                    StreamFrame::Done => {
                        debug!(text_len = self.accumulated.len(), "Chat stream finished");
                        self.completed = true;
                        self.pending_frames.clear();
                    }
                }
            }
            if self.completed || self.exhausted {
                return Ok(None);
            }

            match self.byte_stream.next().await {
                Some(Ok(bytes)) => {
                    self.received_bytes |= !bytes.is_empty();
                    self.decode_chunk(&bytes)?;
                }
                Some(Err(e)) => {
                    self.completed = true;
                    return Err(StudioError::HttpError(format!(
                        "Error reading chat stream: {e}"
                    )));
                }
                None => {
                    self.exhausted = true;
                    if !self.received_bytes {
                        return Err(StudioError::ChatStreamUnavailable);
                    }
                    if !self.utf8_buffer.is_empty() {
                        return Err(StudioError::DecodeError(
                            "Chat stream ended inside a UTF-8 sequence".to_string(),
                        ));
                    }
                    self.pending_frames.extend(self.parser.finish());
                }
            }
        }
    }

    /// Feeds the valid UTF-8 prefix of the buffered bytes into the parser,
    /// keeping an incomplete trailing sequence for the next chunk.
    fn decode_chunk(&mut self, bytes: &[u8]) -> Result<(), StudioError> {
        self.utf8_buffer.extend_from_slice(bytes);

        match std::str::from_utf8(&self.utf8_buffer) {
            Ok(valid) => {
                self.pending_frames.extend(self.parser.feed(valid));
                self.utf8_buffer.clear();
            }
            Err(e) => {
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    let prefix = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to]);
                    self.pending_frames.extend(self.parser.feed(&prefix));
                    self.utf8_buffer.drain(..valid_up_to);
                }
                if e.error_len().is_some() {
                    self.completed = true;
                    return Err(StudioError::DecodeError(
                        "Invalid UTF-8 in chat stream".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Text accumulated so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    /// Drives the stream to the end, handing every snapshot to `on_snapshot`,
    /// and returns the complete text.
    ///
    /// # Errors
    ///
    /// Same as [`ChatStream::next_snapshot`].
    pub async fn collect_text<F>(mut self, mut on_snapshot: F) -> Result<String, StudioError>
    where
        F: FnMut(&str),
    {
        while let Some(snapshot) = self.next_snapshot().await? {
            on_snapshot(&snapshot);
        }
        Ok(self.accumulated)
    }

    /// Adapts the decoder into a `Stream` of snapshots.
    pub fn into_snapshots(self) -> impl Stream<Item = Result<String, StudioError>> + Send {
        futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.next_snapshot().await {
                Ok(Some(snapshot)) => Some((Ok(snapshot), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
