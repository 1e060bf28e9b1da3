//! Synchronous image generation, editing and enhancement requests.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use super::error_message_from_body;
use crate::core::config::EndpointConfig;
use crate::core::models::{EnhanceMode, ImageMode, ImageResult};
use crate::errors::StudioError;
use crate::styles::StyleModifier;

/// Text used when the image endpoint returns images without a caption.
pub const DEFAULT_IMAGE_TEXT: &str = "Here's the image I created for you!";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    prompt: &'a str,
    mode: ImageMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_base64: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceRequest<'a> {
    image_url: &'a str,
    mode: EnhanceMode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnhanceResponse {
    #[serde(default)]
    enhanced_url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Composes image prompts and calls the generation and enhancement endpoints.
#[derive(Debug, Clone)]
pub struct ImageDispatcher {
    http: Client,
    generate_endpoint: EndpointConfig,
    enhance_endpoint: EndpointConfig,
    request_timeout: Duration,
}

impl ImageDispatcher {
    #[must_use]
    pub fn new(
        http: Client,
        generate_endpoint: EndpointConfig,
        enhance_endpoint: EndpointConfig,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            generate_endpoint,
            enhance_endpoint,
            request_timeout,
        }
    }

    /// Generates a new image, or edits `source_image` when one is given.
    ///
    /// # Errors
    ///
    /// - `GenerationRejected` if a 200 response carries an `error` field
    /// - `ImageRequestFailed` on a non-2xx status
    /// - `MissingCredential`, `HttpError`, `DecodeError` for plumbing failures
    #[tracing::instrument(level = "info", skip_all, fields(edit = source_image.is_some()))]
    pub async fn generate(
        &self,
        prompt: &str,
        source_image: Option<&str>,
        style: Option<&StyleModifier>,
    ) -> Result<ImageResult, StudioError> {
        let prompt = match style {
            Some(style) => style.apply(prompt),
            None => prompt.to_string(),
        };
        let body = GenerateRequest {
            prompt: &prompt,
            mode: if source_image.is_some() {
                ImageMode::Edit
            } else {
                ImageMode::Generate
            },
            image_base64: source_image,
        };

        #[cfg(feature = "debug-logs")]
        info!("Image prompt: {}", prompt);

        let text = self.post(&self.generate_endpoint, &body).await?;
        let parsed: GenerateResponse = serde_json::from_str(&text)?;

        if let Some(message) = parsed.error.filter(|m| !m.trim().is_empty()) {
            error!(error = %message, "Image endpoint rejected the request");
            return Err(StudioError::GenerationRejected(message));
        }

        let result = ImageResult {
            text: parsed
                .text
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_TEXT.to_string()),
            images: parsed.images.unwrap_or_default(),
        };
        info!(images = result.images.len(), "Image generation finished");
        Ok(result)
    }

    /// Sends an existing image through the enhancement endpoint and returns
    /// the URL of the improved version.
    ///
    /// # Errors
    ///
    /// - `RateLimited` on 429 and `QuotaExhausted` on 402
    /// - `GenerationRejected` if the body carries an `error` or no URL
    /// - `ImageRequestFailed` on any other non-2xx status
    #[tracing::instrument(level = "info", skip(self, image_url))]
    pub async fn enhance(&self, image_url: &str, mode: EnhanceMode) -> Result<String, StudioError> {
        let body = EnhanceRequest { image_url, mode };

        let text = self.post(&self.enhance_endpoint, &body).await?;
        let parsed: EnhanceResponse = serde_json::from_str(&text)?;

        if let Some(message) = parsed.error.filter(|m| !m.trim().is_empty()) {
            return Err(StudioError::GenerationRejected(message));
        }

        parsed
            .enhanced_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| StudioError::GenerationRejected("No enhanced image returned".to_string()))
    }

    /// POSTs `body` as JSON and returns the raw body of a 2xx response.
    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &EndpointConfig,
        body: &T,
    ) -> Result<String, StudioError> {
        let auth = endpoint.bearer()?;

        let response = self
            .http
            .post(endpoint.url.clone())
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, auth)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }

        error!(status = %status, url = %endpoint.url, "Image endpoint returned an error");
        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => StudioError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => StudioError::QuotaExhausted,
            _ => StudioError::ImageRequestFailed {
                status: status.as_u16(),
                message: error_message_from_body(&text)
                    .unwrap_or_else(|| format!("Image service error: {}", status.as_u16())),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_shape() {
        let body = GenerateRequest {
            prompt: "a cat",
            mode: ImageMode::Generate,
            image_base64: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"prompt": "a cat", "mode": "generate"})
        );

        let body = GenerateRequest {
            prompt: "a cat",
            mode: ImageMode::Edit,
            image_base64: Some("data:image/png;base64,AAAA"),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mode"], "edit");
        assert_eq!(json["imageBase64"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_enhance_request_shape() {
        let body = EnhanceRequest {
            image_url: "https://x/img.png",
            mode: EnhanceMode::Upscale,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"imageUrl": "https://x/img.png", "mode": "upscale"})
        );
    }
}
