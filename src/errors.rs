use thiserror::Error;

/// Generic text shown when a failed chat response carries no readable message.
pub const DEFAULT_CHAT_FAILURE: &str = "Failed to get response";

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Chat request failed (status {status}): {message}")]
    ChatRequestFailed { status: u16, message: String },

    #[error("Chat response has no readable body")]
    ChatStreamUnavailable,

    #[error("Failed to submit generation task: {0}")]
    TaskSubmissionFailed(String),

    #[error("Generation task failed: {0}")]
    TaskFailed(String),

    #[error("Generation task timed out after {attempts} status checks")]
    TaskTimedOut { attempts: u32 },

    #[error("Generation rejected: {0}")]
    GenerationRejected(String),

    #[error("Image request failed (status {status}): {message}")]
    ImageRequestFailed { status: u16, message: String },

    #[error("Rate limit exceeded. Please try again in a moment.")]
    RateLimited,

    #[error("AI credits exhausted. Please add more credits to continue.")]
    QuotaExhausted,

    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to decode response: {0}")]
    DecodeError(String),
}

impl StudioError {
    /// Text suitable for a notification or a synthesized assistant message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::ChatRequestFailed { message, .. } | Self::ImageRequestFailed { message, .. } => {
                message.clone()
            }
            Self::TaskSubmissionFailed(msg) | Self::GenerationRejected(msg) => msg.clone(),
            Self::TaskFailed(_) => "Video generation failed. Please try again.".to_string(),
            Self::TaskTimedOut { .. } => "Video generation timed out. Please try again.".to_string(),
            Self::MissingCredential(name) => {
                format!("{name} is not configured. Please add it to the environment.")
            }
            Self::ChatStreamUnavailable => "No response body".to_string(),
            other => other.to_string(),
        }
    }

    /// Cancellation is caller-initiated and never surfaces as a notification.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(error: reqwest::Error) -> Self {
        StudioError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(error: serde_json::Error) -> Self {
        StudioError::DecodeError(error.to_string())
    }
}
