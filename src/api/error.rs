//! Mapping of proxy failures onto HTTP status codes and `{error}` bodies

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use super::models::ErrorBody;
use crate::gemini::GeminiError;

pub const MISSING_API_KEY_MESSAGE: &str =
    "Gemini API key not configured. Please set GEMINI_API_KEY in the server environment";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error("Invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Gemini(#[from] GeminiError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            // Unparseable and wrongly typed JSON are both a bad request;
            // size and content-type rejections keep their own status
            ApiError::InvalidBody(
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::Gemini(GeminiError::Upstream { status, .. }) => {
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Gemini(GeminiError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Gemini(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `{error}` body
    pub fn message(&self) -> String {
        match self {
            ApiError::Gemini(GeminiError::Transport(_)) | ApiError::Gemini(GeminiError::Decode(_)) => {
                format!("Server error: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, message);
        } else {
            warn!("Request rejected ({}): {}", status, message);
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::MissingApiKey.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(GeminiError::InvalidResponse).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(GeminiError::InvalidRequest("bad frame".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_status_passthrough() {
        let err = ApiError::from(GeminiError::Upstream {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            message: "quota exceeded".into(),
        });
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message(), "Gemini API Error: quota exceeded");
    }

    #[test]
    fn test_decode_errors_are_wrapped() {
        let decode = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = ApiError::from(GeminiError::Decode(decode));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message().starts_with("Server error: "));
    }

    #[test]
    fn test_fixed_messages() {
        assert_eq!(ApiError::MissingApiKey.message(), MISSING_API_KEY_MESSAGE);
        assert_eq!(
            ApiError::from(GeminiError::InvalidResponse).message(),
            "Invalid response format from Gemini API"
        );
    }
}
