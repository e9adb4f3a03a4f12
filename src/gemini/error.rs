use reqwest::StatusCode;

/// Default message when the upstream error body carries none
pub const DEFAULT_UPSTREAM_MESSAGE: &str = "Failed to get response from Gemini";

#[derive(thiserror::Error, Debug)]
pub enum GeminiError {
    #[error("Gemini API Error: {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Invalid response format from Gemini API")]
    InvalidResponse,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

impl GeminiError {
    /// Build an upstream error from a non-success status and its raw body.
    ///
    /// JSON bodies contribute `error.message` when present, otherwise the
    /// default message. Non-JSON bodies fall back to the status reason phrase.
    pub fn from_upstream(status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<super::types::ErrorEnvelope>(body) {
            Ok(envelope) => envelope
                .error
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| DEFAULT_UPSTREAM_MESSAGE.to_string()),
            Err(_) => status
                .canonical_reason()
                .unwrap_or(DEFAULT_UPSTREAM_MESSAGE)
                .to_string(),
        };

        GeminiError::Upstream { status, message }
    }
}
