//! Video Q&A
//!
//! Ask natural-language questions about a video. The sampler captures one
//! frame per second plus any subtitle text; the proxy turns that into a
//! multimodal Gemini request and relays the answer.

pub mod api;
pub mod config;
pub mod gemini;
pub mod logging;
pub mod sampler;

// Re-export main types for easy access
pub use crate::api::{ApiServer, AskRequest, AskResponse};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::gemini::{GeminiClient, GeminiError, GenerativeModel, PromptBuilder};
pub use crate::sampler::{FfmpegSource, Frame, FrameSource, ProxyClient, Session, SubtitleTrack};
