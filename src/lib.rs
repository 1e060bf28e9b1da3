/// Muse - a chat studio that talks to an AI assistant, generates and
/// enhances images, and animates images into short videos.
///
/// The crate wraps three remote AI HTTP APIs:
/// 1. A chat-completion endpoint answered as a Server-Sent-Events stream,
///    decoded incrementally into snapshots of the assistant reply
/// 2. Synchronous image generation/edit and enhancement endpoints
/// 3. An image-to-video task API, driven through create → poll → resolve
///
/// # Architecture
///
/// The system uses:
/// - reqwest for HTTP, with streamed response bodies for chat
/// - Tokio for the async runtime, timers and cancellation
/// - serde/serde_json for wire formats
/// - tracing for structured logs
///
/// # Example
///
/// ```no_run
/// use muse::core::config::AppConfig;
/// use muse::studio::Studio;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     muse::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let mut studio = Studio::from_config(&config)?;
///
///     let cancel = CancellationToken::new();
///     let failure = studio
///         .send_message("Tell me a joke", None, None, &cancel, |text| {
///             println!("{text}");
///         })
///         .await;
///
///     if let Some(notification) = failure {
///         eprintln!("{notification:?}");
///     }
///     Ok(())
/// }
/// ```
// Module declarations
pub mod ai;
pub mod core;
pub mod errors;
pub mod studio;
pub mod styles;

pub use errors::StudioError;

/// Configure structured logging with JSON format.
///
/// Log levels follow `RUST_LOG` and default to `info`. Safe to call more
/// than once; later calls leave the first subscriber in place.
///
/// # Example
///
/// ```
/// muse::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
