use async_trait::async_trait;
use tracing::debug;

use super::error::GeminiError;
use super::types::{GenerateContentRequest, GenerateContentResponse};
use super::GenerativeModel;
use crate::config::GeminiConfig;

/// Gemini generateContent client.
///
/// One POST per call. No retry, no streaming, and no timeout beyond the
/// HTTP client's defaults. Transport errors drop the URL, which carries the key.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, config: &GeminiConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
        }
    }

    /// URL without the key query parameter
    pub fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<String, GeminiError> {
        debug!(
            "Sending request to Gemini API ({}, {} parts)",
            self.model,
            request.parts().len()
        );

        let response = self
            .client
            .post(self.url())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        if !status.is_success() {
            return Err(GeminiError::from_upstream(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        if let Some(tokens) = parsed
            .usage_metadata
            .as_ref()
            .and_then(|usage| usage.total_token_count)
        {
            debug!("Gemini used {} tokens", tokens);
        }

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or(GeminiError::InvalidResponse)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
