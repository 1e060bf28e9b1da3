//! Conversation orchestration.
//!
//! Decides whether a submission is a chat turn or an image request, routes
//! it to the matching client and records the outcome in an append-only
//! conversation log. Failures never escape: they become a synthesized
//! assistant reply plus a [`Notification`].

use once_cell::sync::Lazy;
use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::ai::{ChatClient, ImageDispatcher, RunwayClient, VideoGenerator, build_http_client};
use crate::core::config::AppConfig;
use crate::core::models::{ConversationTurn, EnhanceMode, Role, VideoJob};
use crate::errors::StudioError;
use crate::styles::StyleModifier;

static IMAGE_INTENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(generate|create|make|draw|design|image|picture|photo|illustration|art|visualize|render)",
    )
    .expect("static regex compile")
});

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Chat,
    Image,
}

impl Intent {
    /// Keyword heuristic: an image word anywhere in the text (substring,
    /// case-insensitive), an attached image, or a real style all route to
    /// image generation.
    #[must_use]
    pub fn detect(text: &str, has_image: bool, style: Option<&StyleModifier>) -> Self {
        let styled = style.is_some_and(|s| !s.is_none());
        if has_image || styled || IMAGE_INTENT_RE.is_match(text) {
            Self::Image
        } else {
            Self::Chat
        }
    }
}

/// User-facing toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    /// `None` for errors that must stay silent (cancellation).
    #[must_use]
    pub fn from_error(error: &StudioError) -> Option<Self> {
        (!error.is_silent()).then(|| Self::Error(error.user_message()))
    }
}

/// A generated image together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    pub url: String,
    pub prompt: String,
    pub style_label: Option<String>,
}

/// Append-only log of conversation turns.
///
/// The only in-place edit is the content of a trailing assistant turn that
/// is still being streamed.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Replaces the trailing assistant turn's content with `snapshot`, or
    /// appends a new assistant turn if the tail belongs to the user.
    pub fn set_streaming_reply(&mut self, snapshot: &str) {
        match self.turns.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content.clear();
                last.content.push_str(snapshot);
            }
            _ => self.turns.push(ConversationTurn::assistant(snapshot)),
        }
    }

    /// Every generated image, paired with the user turn that requested it.
    #[must_use]
    pub fn gallery(&self) -> Vec<GalleryItem> {
        let mut items = Vec::new();
        for (idx, turn) in self.turns.iter().enumerate() {
            if turn.role != Role::Assistant || turn.images.is_empty() {
                continue;
            }
            let request = idx
                .checked_sub(1)
                .and_then(|prev| self.turns.get(prev))
                .filter(|t| t.role == Role::User);
            let prompt = request
                .map(|t| t.content.as_str())
                .filter(|c| !c.is_empty())
                .unwrap_or("Generated image");

            for url in &turn.images {
                items.push(GalleryItem {
                    url: url.clone(),
                    prompt: prompt.to_string(),
                    style_label: request.and_then(|t| t.style_label.clone()),
                });
            }
        }
        items
    }
}

#[must_use]
pub fn failure_reply(message: &str) -> String {
    format!("I'm sorry, I encountered an error: {message}. Please try again.")
}

/// Owns the clients and the conversation for one chat session.
///
/// Every submission takes `&mut self`, so a second request cannot start
/// while one is still consuming the conversation tail.
#[derive(Debug)]
pub struct Studio {
    chat: ChatClient,
    images: ImageDispatcher,
    video: VideoGenerator,
    conversation: Conversation,
}

impl Studio {
    #[must_use]
    pub fn new(chat: ChatClient, images: ImageDispatcher, video: VideoGenerator) -> Self {
        Self {
            chat,
            images,
            video,
            conversation: Conversation::new(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, StudioError> {
        let http = build_http_client(config.request_timeout)?;
        Ok(Self::new(
            ChatClient::new(http.clone(), config.chat.clone()),
            ImageDispatcher::new(
                http.clone(),
                config.image.clone(),
                config.enhance.clone(),
                config.request_timeout,
            ),
            VideoGenerator::new(
                RunwayClient::new(http, config.video.clone(), config.request_timeout),
                config.poll,
            ),
        ))
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Submits one user message.
    ///
    /// `on_snapshot` receives the full assistant text after every streamed
    /// delta. Returns a notification when the request failed; empty input
    /// is ignored.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn send_message<F>(
        &mut self,
        text: &str,
        image: Option<&str>,
        style: Option<&StyleModifier>,
        cancel: &CancellationToken,
        on_snapshot: F,
    ) -> Option<Notification>
    where
        F: FnMut(&str),
    {
        if text.trim().is_empty() && image.is_none() {
            return None;
        }

        let style = style.filter(|s| !s.is_none());
        let mut turn = ConversationTurn::user(text);
        if let Some(image) = image {
            turn = turn.with_image(image);
        }
        if let Some(style) = style {
            turn = turn.with_style_label(style.display_name);
        }
        self.conversation.push(turn);

        let intent = Intent::detect(text, image.is_some(), style);
        info!(intent = ?intent, turns = self.conversation.len(), "Handling user message");

        let result = match intent {
            Intent::Chat => self.stream_reply(cancel, on_snapshot).await,
            Intent::Image => self.image_reply(text, image, style, cancel).await,
        };

        let error = result.err()?;
        if error.is_silent() {
            warn!("Request cancelled");
            return None;
        }

        error!(error = %error, "Send message error");
        let message = error.user_message();
        self.conversation
            .push(ConversationTurn::assistant(failure_reply(&message)));
        Some(Notification::Error(message))
    }

    async fn stream_reply<F>(
        &mut self,
        cancel: &CancellationToken,
        mut on_snapshot: F,
    ) -> Result<(), StudioError>
    where
        F: FnMut(&str),
    {
        let Some((new_turn, history)) = self.conversation.turns().split_last() else {
            return Ok(());
        };

        let mut stream = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StudioError::Cancelled),
            opened = self.chat.send(history, new_turn) => opened?,
        };

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(StudioError::Cancelled),
                next = stream.next_snapshot() => next?,
            };
            let Some(snapshot) = next else {
                return Ok(());
            };
            self.conversation.set_streaming_reply(&snapshot);
            on_snapshot(&snapshot);
        }
    }

    async fn image_reply(
        &mut self,
        text: &str,
        image: Option<&str>,
        style: Option<&StyleModifier>,
        cancel: &CancellationToken,
    ) -> Result<(), StudioError> {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StudioError::Cancelled),
            generated = self.images.generate(text, image, style) => generated?,
        };

        self.conversation
            .push(ConversationTurn::assistant(result.text).with_images(result.images));
        Ok(())
    }

    /// Runs an image through the enhancer. The conversation is not touched.
    ///
    /// # Errors
    ///
    /// See [`ImageDispatcher::enhance`].
    pub async fn enhance_image(
        &self,
        image_url: &str,
        mode: EnhanceMode,
    ) -> Result<String, StudioError> {
        self.images.enhance(image_url, mode).await
    }

    /// Animates `image_url` into a short video and returns the video URL.
    /// The conversation is not touched.
    ///
    /// # Errors
    ///
    /// `TaskSubmissionFailed` for a missing image, otherwise see
    /// [`VideoGenerator::run`](crate::ai::TaskPoller::run).
    pub async fn animate_image(
        &self,
        image_url: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, StudioError> {
        if image_url.trim().is_empty() {
            return Err(StudioError::TaskSubmissionFailed(
                "Please provide an image to animate".to_string(),
            ));
        }
        let job = VideoJob {
            prompt_text: prompt.trim().to_string(),
            prompt_image: image_url.to_string(),
        };
        self.video.run(&job, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styles::style_by_id;

    #[test]
    fn test_intent_keywords() {
        assert_eq!(Intent::detect("Draw a red fox", false, None), Intent::Image);
        assert_eq!(Intent::detect("please RENDER this", false, None), Intent::Image);
        assert_eq!(Intent::detect("visualize the data", false, None), Intent::Image);
        assert_eq!(Intent::detect("What is the capital of France?", false, None), Intent::Chat);
    }

    #[test]
    fn test_intent_matches_keywords_inside_words() {
        assert_eq!(Intent::detect("let's start over", false, None), Intent::Image);
        assert_eq!(Intent::detect("Imagine a dragon", false, None), Intent::Image);
        assert_eq!(Intent::detect("visualise the data", false, None), Intent::Chat);
    }

    #[test]
    fn test_intent_image_or_style_forces_image() {
        let anime = style_by_id("anime");
        let none = style_by_id("none");
        assert_eq!(Intent::detect("hello", true, None), Intent::Image);
        assert_eq!(Intent::detect("hello", false, anime), Intent::Image);
        assert_eq!(Intent::detect("hello", false, none), Intent::Chat);
    }

    #[test]
    fn test_streaming_reply_replaces_tail_in_place() {
        let mut conversation = Conversation::new();
        conversation.push(ConversationTurn::user("hi"));

        conversation.set_streaming_reply("He");
        conversation.set_streaming_reply("Hello");

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turns()[1].role, Role::Assistant);
        assert_eq!(conversation.turns()[1].content, "Hello");
    }

    #[test]
    fn test_gallery_pairs_images_with_request() {
        let mut conversation = Conversation::new();
        conversation.push(ConversationTurn::user("a castle").with_style_label("Fantasy Art"));
        conversation.push(
            ConversationTurn::assistant("done")
                .with_images(vec!["https://x/1.png".into(), "https://x/2.png".into()]),
        );
        conversation.push(ConversationTurn::user("thanks"));
        conversation.push(ConversationTurn::assistant("you're welcome"));

        let gallery = conversation.gallery();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[0].prompt, "a castle");
        assert_eq!(gallery[1].url, "https://x/2.png");
        assert_eq!(gallery[1].style_label.as_deref(), Some("Fantasy Art"));
    }

    #[test]
    fn test_gallery_falls_back_for_image_only_request() {
        let mut conversation = Conversation::new();
        conversation.push(ConversationTurn::user("").with_image("https://x/in.png"));
        conversation
            .push(ConversationTurn::assistant("done").with_images(vec!["https://x/out.png".into()]));
        conversation
            .push(ConversationTurn::assistant("again").with_images(vec!["https://x/more.png".into()]));

        let gallery = conversation.gallery();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[0].prompt, "Generated image");
        assert_eq!(gallery[1].prompt, "Generated image");
    }

    #[test]
    fn test_notification_skips_cancellation() {
        assert_eq!(Notification::from_error(&StudioError::Cancelled), None);
        assert_eq!(
            Notification::from_error(&StudioError::RateLimited),
            Some(Notification::Error(
                "Rate limit exceeded. Please try again in a moment.".to_string()
            ))
        );
    }
}
