//! Clients for the remote AI services.

pub mod chat;
pub mod image;
pub mod poller;
pub mod sse;
pub mod video;

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::errors::StudioError;

// Re-export main types for convenience
pub use chat::{ChatClient, ChatStream};
pub use image::ImageDispatcher;
pub use poller::{TaskBackend, TaskPoller};
pub use sse::{SseParser, StreamFrame};
pub use video::{RunwayClient, VideoGenerator};

/// Builds the shared HTTP client.
///
/// Only connection setup is bounded here; streamed chat bodies may run long,
/// so request-level timeouts are applied per call by the non-streaming clients.
///
/// # Errors
///
/// Returns `StudioError::HttpError` if the TLS backend cannot be initialised.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, StudioError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| StudioError::HttpError(format!("Failed to build HTTP client: {e}")))
}

/// Best-effort extraction of a server error message from a JSON body.
///
/// Accepts both `{"error": "text"}` and `{"error": {"message": "text"}}`.
#[must_use]
pub fn error_message_from_body(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;

    error
        .as_str()
        .or_else(|| error.get("message").and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_flat_body() {
        assert_eq!(
            error_message_from_body(r#"{"error":"Rate limited"}"#),
            Some("Rate limited".to_string())
        );
    }

    #[test]
    fn test_error_message_from_nested_body() {
        assert_eq!(
            error_message_from_body(r#"{"error":{"message":"bad key","code":401}}"#),
            Some("bad key".to_string())
        );
    }

    #[test]
    fn test_error_message_absent() {
        assert_eq!(error_message_from_body("<html>oops</html>"), None);
        assert_eq!(error_message_from_body(r#"{"detail":"x"}"#), None);
        assert_eq!(error_message_from_body(r#"{"error":""}"#), None);
    }
}
