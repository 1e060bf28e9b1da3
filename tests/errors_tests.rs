use muse::errors::StudioError;
use std::error::Error;

#[test]
fn test_studio_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = StudioError::DecodeError("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_studio_error_display() {
    let error = StudioError::HttpError("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );

    let error = StudioError::TaskTimedOut { attempts: 60 };
    assert_eq!(
        format!("{error}"),
        "Generation task timed out after 60 status checks"
    );

    let error = StudioError::MissingCredential("RUNWAY_API_KEY");
    assert_eq!(format!("{error}"), "RUNWAY_API_KEY is not configured");
}

#[test]
fn test_user_messages() {
    let error = StudioError::ChatRequestFailed {
        status: 500,
        message: "Model overloaded".to_string(),
    };
    assert_eq!(error.user_message(), "Model overloaded");

    assert_eq!(
        StudioError::TaskFailed("content policy".to_string()).user_message(),
        "Video generation failed. Please try again."
    );
    assert_eq!(
        StudioError::TaskTimedOut { attempts: 3 }.user_message(),
        "Video generation timed out. Please try again."
    );
    assert_eq!(
        StudioError::QuotaExhausted.user_message(),
        "AI credits exhausted. Please add more credits to continue."
    );
    assert_eq!(
        StudioError::ChatStreamUnavailable.user_message(),
        "No response body"
    );
    assert_eq!(
        StudioError::MissingCredential("MUSE_API_KEY").user_message(),
        "MUSE_API_KEY is not configured. Please add it to the environment."
    );
}

#[test]
fn test_only_cancellation_is_silent() {
    assert!(StudioError::Cancelled.is_silent());
    assert!(!StudioError::RateLimited.is_silent());
    assert!(!StudioError::GenerationRejected("no".to_string()).is_silent());
}

#[test]
fn test_from_serde_json_error() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let studio_err: StudioError = err.into();
    assert!(matches!(studio_err, StudioError::DecodeError(_)));

    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> StudioError {
        StudioError::from(err)
    }
}
