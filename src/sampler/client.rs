use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::api::AskRequest;

/// Transport that turns a question payload into an answer
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, request: &AskRequest) -> Result<String>;
}

/// Posts questions to the proxy's `/api/gemini` endpoint
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

/// Either field may be present; `error` takes precedence
#[derive(Debug, Deserialize)]
struct ProxyReply {
    answer: Option<String>,
    error: Option<String>,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/gemini", self.base_url)
    }
}

#[async_trait]
impl AnswerService for ProxyClient {
    async fn ask(&self, request: &AskRequest) -> Result<String> {
        debug!("Posting question with {} frames to {}", request.frames().len(), self.endpoint());

        let response = self.client.post(self.endpoint()).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The reply body decides the outcome, not the status code
        let reply: ProxyReply = serde_json::from_str(&body)
            .map_err(|e| anyhow!("Unexpected response from server ({}): {}", status, e))?;

        if let Some(error) = reply.error {
            bail!(error);
        }

        reply
            .answer
            .ok_or_else(|| anyhow!("Server response contained no answer"))
    }
}
