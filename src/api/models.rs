//! API data models

use serde::{Deserialize, Serialize};

/// Body of `POST /api/gemini`.
///
/// Every field is optional on the wire. Captions may arrive as either
/// `captions` or `subtitles`; `captions` wins when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_frames: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<String>,
}

impl AskRequest {
    /// Payload as the sampler sends it
    pub fn new(question: impl Into<String>, video_frames: Vec<String>, subtitles: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            video_frames: Some(video_frames),
            captions: None,
            subtitles: Some(subtitles.into()),
        }
    }

    pub fn question(&self) -> &str {
        self.question.as_deref().unwrap_or_default()
    }

    pub fn frames(&self) -> &[String] {
        self.video_frames.as_deref().unwrap_or_default()
    }

    pub fn caption_text(&self) -> Option<&str> {
        self.captions.as_deref().or(self.subtitles.as_deref())
    }
}

/// Successful answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Error body shared by every failing endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub has_api_key: bool,
}
