//! Typed assembly of the multimodal question request.
//!
//! The part order is fixed: preamble with the question, optional captions,
//! closing instruction, then one inline JPEG part per frame.

use base64::{engine::general_purpose::STANDARD, Engine};

use super::error::GeminiError;
use super::types::{Content, GenerateContentRequest, GenerationConfig, Part};

pub const TEMPERATURE: f32 = 0.7;
pub const MAX_OUTPUT_TOKENS: u32 = 2048;

pub const CAPTIONS_HEADER: &str = "Here are the video captions with timestamps:";
pub const CLOSING_INSTRUCTION: &str = "Please provide a detailed analysis based on both the video frames and the captions. Reference specific timestamps when relevant to your answer.";

/// Preamble part naming the user's question verbatim
pub fn preamble(question: &str) -> String {
    format!(
        "You are analyzing a video. The user has uploaded a video and is asking questions about it. Here's their question: \"{}\".",
        question
    )
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    question: String,
    captions: Option<String>,
    frames: Vec<String>,
}

impl PromptBuilder {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Captions are kept only when non-blank after trimming
    pub fn with_captions(mut self, captions: Option<&str>) -> Self {
        self.captions = captions
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frames.push(frame.into());
        self
    }

    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames.extend(frames.into_iter().map(Into::into));
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn has_captions(&self) -> bool {
        self.captions.is_some()
    }

    /// Check every frame is bare base64 image data
    pub fn validate(&self) -> Result<(), GeminiError> {
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.is_empty() {
                return Err(GeminiError::InvalidRequest(format!("frame {} is empty", index)));
            }
            if frame.starts_with("data:") {
                return Err(GeminiError::InvalidRequest(format!(
                    "frame {} must not carry a data URI prefix",
                    index
                )));
            }
            if STANDARD.decode(frame).is_err() {
                return Err(GeminiError::InvalidRequest(format!(
                    "frame {} is not valid base64 image data",
                    index
                )));
            }
        }
        Ok(())
    }

    pub fn build(self) -> Result<GenerateContentRequest, GeminiError> {
        self.validate()?;

        let mut parts = Vec::with_capacity(self.frames.len() + 3);
        parts.push(Part::text(preamble(&self.question)));
        if let Some(captions) = &self.captions {
            parts.push(Part::text(format!("{}\n{}", CAPTIONS_HEADER, captions)));
        }
        parts.push(Part::text(CLOSING_INSTRUCTION));
        parts.extend(self.frames.into_iter().map(Part::jpeg));

        Ok(GenerateContentRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        })
    }
}
