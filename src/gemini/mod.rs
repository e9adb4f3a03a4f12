//! Gemini multimodal generation: typed request assembly and the HTTP client

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

use async_trait::async_trait;

pub use client::GeminiClient;
pub use error::GeminiError;
pub use prompt::PromptBuilder;
pub use types::{GenerateContentRequest, Part};

/// A model that answers a fully assembled generateContent request
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<String, GeminiError>;
    fn model_name(&self) -> &str;
}
