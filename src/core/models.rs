use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Opaque image reference (URL or data URL) sent along with the turn.
    pub attached_image: Option<String>,
    /// Images produced for an assistant turn.
    pub images: Vec<String>,
    pub style_label: Option<String>,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            attached_image: None,
            images: Vec::new(),
            style_label: None,
        }
    }

    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.attached_image = Some(image.into());
        self
    }

    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    #[must_use]
    pub fn with_style_label(mut self, label: impl Into<String>) -> Self {
        self.style_label = Some(label.into());
        self
    }
}

/// Wire shape of one message in the chat request body.
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: Role,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

impl<'a> From<&'a ConversationTurn> for ChatMessage<'a> {
    fn from(turn: &'a ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: &turn.content,
            image: turn.attached_image.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Server-assigned identifier of a submitted generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub task_id: String,
}

/// One status check result for a generation task.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationTask {
    #[serde(default, rename = "id")]
    pub task_id: String,
    pub status: TaskStatus,
    /// Absent or `null` until the task has produced something.
    #[serde(default)]
    pub output: Option<Vec<String>>,
    #[serde(default)]
    pub failure: Option<String>,
}

impl GenerationTask {
    #[must_use]
    pub fn result_url(&self) -> Option<&str> {
        self.output.as_deref()?.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub prompt_text: String,
    pub prompt_image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    Generate,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResult {
    pub text: String,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhanceMode {
    Upscale,
    #[default]
    Enhance,
    Restore,
}

impl EnhanceMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upscale => "upscale",
            Self::Enhance => "enhance",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for EnhanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnhanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upscale" => Ok(Self::Upscale),
            "enhance" => Ok(Self::Enhance),
            "restore" => Ok(Self::Restore),
            other => Err(format!("unknown enhance mode: {other}")),
        }
    }
}
