//! API request handlers

use axum::extract::rejection::JsonRejection;
use tracing::info;

use super::error::ApiError;
use super::models::{AskRequest, AskResponse, HealthResponse};
use crate::config::Config;
use crate::gemini::{GeminiClient, GenerativeModel, PromptBuilder};

/// Handle health check requests
pub fn health_check(config: &Config) -> HealthResponse {
    HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        has_api_key: config.gemini.has_api_key(),
    }
}

/// Handle a question about a video.
///
/// The API key is checked before the body so a missing key always yields
/// the same error whatever was posted.
pub async fn answer_question(
    config: &Config,
    http: &reqwest::Client,
    payload: Result<AskRequest, JsonRejection>,
) -> Result<AskResponse, ApiError> {
    let api_key = config
        .gemini
        .api_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or(ApiError::MissingApiKey)?;

    let request = payload?;

    let client = GeminiClient::new(http.clone(), &config.gemini, api_key);
    ask_model(&client, &request).await
}

/// Assemble the upstream request and extract the answer
pub async fn ask_model(model: &dyn GenerativeModel, request: &AskRequest) -> Result<AskResponse, ApiError> {
    let builder = PromptBuilder::new(request.question())
        .with_captions(request.caption_text())
        .with_frames(request.frames().iter().cloned());

    info!(
        "❓ Question received ({} frames, captions: {}) for {}",
        builder.frame_count(),
        builder.has_captions(),
        model.model_name()
    );

    let upstream_request = builder.build()?;
    let answer = model.generate(&upstream_request).await?;

    info!("✅ Answer generated ({} chars)", answer.len());
    Ok(AskResponse { answer })
}
