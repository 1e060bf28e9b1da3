//! Image-to-video generation against the Runway task API.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use super::poller::{TaskBackend, TaskPoller};
use crate::core::config::EndpointConfig;
use crate::core::models::{GenerationTask, TaskHandle, VideoJob};
use crate::errors::StudioError;

pub const VIDEO_MODEL: &str = "gen3a_turbo";
pub const VIDEO_DURATION_SECS: u32 = 5;
pub const VIDEO_RATIO: &str = "16:9";
pub const RUNWAY_VERSION: &str = "2024-11-06";
pub const DEFAULT_ANIMATION_PROMPT: &str = "Animate this image with smooth, natural motion";

const RUNWAY_VERSION_HEADER: &str = "X-Runway-Version";

/// Submit → poll → resolve for video jobs.
pub type VideoGenerator = TaskPoller<RunwayClient>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageToVideoRequest<'a> {
    model: &'static str,
    prompt_image: &'a str,
    prompt_text: &'a str,
    duration: u32,
    ratio: &'static str,
}

#[derive(Debug, Deserialize)]
struct TaskCreated {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunwayClient {
    http: Client,
    endpoint: EndpointConfig,
    request_timeout: Duration,
}

impl RunwayClient {
    #[must_use]
    pub fn new(http: Client, endpoint: EndpointConfig, request_timeout: Duration) -> Self {
        Self {
            http,
            endpoint,
            request_timeout,
        }
    }

    fn url(&self, path: &str) -> Result<url::Url, StudioError> {
        self.endpoint
            .url
            .join(path)
            .map_err(|e| StudioError::Config(format!("Invalid video API path {path}: {e}")))
    }
}

#[async_trait]
impl TaskBackend for RunwayClient {
    type Job = VideoJob;

    #[tracing::instrument(level = "info", skip_all)]
    async fn submit(&self, job: &VideoJob) -> Result<TaskHandle, StudioError> {
        let auth = self.endpoint.bearer()?;

        let prompt_text = match job.prompt_text.trim() {
            "" => DEFAULT_ANIMATION_PROMPT,
            text => text,
        };
        let body = ImageToVideoRequest {
            model: VIDEO_MODEL,
            prompt_image: &job.prompt_image,
            prompt_text,
            duration: VIDEO_DURATION_SECS,
            ratio: VIDEO_RATIO,
        };

        info!(prompt_len = prompt_text.len(), "Creating video generation task");

        let response = self
            .http
            .post(self.url("v1/image_to_video")?)
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .header(RUNWAY_VERSION_HEADER, RUNWAY_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| StudioError::TaskSubmissionFailed(format!("Runway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_text, "Runway API error");
            return Err(match status {
                StatusCode::UNAUTHORIZED => StudioError::TaskSubmissionFailed(
                    "Invalid Runway API key. Please check your API key.".to_string(),
                ),
                StatusCode::TOO_MANY_REQUESTS => StudioError::RateLimited,
                _ => StudioError::TaskSubmissionFailed(format!(
                    "Runway API error: {}",
                    status.as_u16()
                )),
            });
        }

        let created: TaskCreated = response.json().await.map_err(|e| {
            StudioError::TaskSubmissionFailed(format!("Failed to parse Runway response: {e}"))
        })?;

        created
            .id
            .filter(|id| !id.trim().is_empty())
            .map(|task_id| TaskHandle { task_id })
            .ok_or_else(|| {
                StudioError::TaskSubmissionFailed("Runway response contained no task id".to_string())
            })
    }

    async fn check(&self, handle: &TaskHandle) -> Result<GenerationTask, StudioError> {
        let auth = self.endpoint.bearer()?;
        let path = format!("v1/tasks/{}", urlencoding::encode(&handle.task_id));

        let response = self
            .http
            .get(self.url(&path)?)
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, auth)
            .header(RUNWAY_VERSION_HEADER, RUNWAY_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::HttpError(format!(
                "Status check failed: {}",
                status.as_u16()
            )));
        }

        let task: GenerationTask = response.json().await?;
        Ok(task)
    }
}
