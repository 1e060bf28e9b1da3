use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use url::Url;

use crate::errors::StudioError;

pub const DEFAULT_VIDEO_URL: &str = "https://api.dev.runwayml.com";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 60;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Location and credential of one remote service.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub url: Url,
    pub api_key: Option<SecretString>,
    /// Name reported in `MissingCredential` when `api_key` is absent.
    pub credential_name: &'static str,
}

impl EndpointConfig {
    /// # Errors
    ///
    /// Returns `StudioError::Config` if `url` does not parse.
    pub fn new(
        url: &str,
        api_key: Option<String>,
        credential_name: &'static str,
    ) -> Result<Self, StudioError> {
        let url = Url::parse(url).map_err(|e| StudioError::Config(format!("{url}: {e}")))?;
        Ok(Self {
            url,
            api_key: api_key.filter(|k| !k.trim().is_empty()).map(SecretString::from),
            credential_name,
        })
    }

    /// Builds the `Authorization` header value, failing the request when the
    /// credential was never provided.
    pub(crate) fn bearer(&self) -> Result<String, StudioError> {
        self.api_key
            .as_ref()
            .map(|k| format!("Bearer {}", k.expose_secret()))
            .ok_or(StudioError::MissingCredential(self.credential_name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub chat: EndpointConfig,
    pub image: EndpointConfig,
    pub enhance: EndpointConfig,
    pub video: EndpointConfig,
    pub poll: PollPolicy,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `StudioError::Config` when a required URL is missing or
    /// malformed, or a numeric setting does not parse. Missing credentials
    /// are not an error here; they fail the individual request later.
    pub fn from_env() -> Result<Self, StudioError> {
        let gateway_key = env::var("MUSE_API_KEY").ok();

        Ok(Self {
            chat: EndpointConfig::new(&required("MUSE_CHAT_URL")?, gateway_key.clone(), "MUSE_API_KEY")?,
            image: EndpointConfig::new(&required("MUSE_IMAGE_URL")?, gateway_key.clone(), "MUSE_API_KEY")?,
            enhance: EndpointConfig::new(&required("MUSE_ENHANCE_URL")?, gateway_key, "MUSE_API_KEY")?,
            video: EndpointConfig::new(
                &env::var("MUSE_VIDEO_URL").unwrap_or_else(|_| DEFAULT_VIDEO_URL.to_string()),
                env::var("RUNWAY_API_KEY").ok(),
                "RUNWAY_API_KEY",
            )?,
            poll: PollPolicy {
                interval: Duration::from_secs(parse_or(
                    "MUSE_POLL_INTERVAL_SECS",
                    DEFAULT_POLL_INTERVAL.as_secs(),
                )?),
                max_attempts: parse_or("MUSE_POLL_MAX_ATTEMPTS", DEFAULT_POLL_MAX_ATTEMPTS)?,
            },
            request_timeout: Duration::from_secs(parse_or(
                "MUSE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT.as_secs(),
            )?),
        })
    }
}

fn required(name: &str) -> Result<String, StudioError> {
    env::var(name).map_err(|e| StudioError::Config(format!("{name}: {e}")))
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, StudioError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| StudioError::Config(format!("{name}: {e}"))),
        Err(_) => Ok(default),
    }
}
