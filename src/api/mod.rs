//! API module for the video Q&A proxy
//!
//! Accepts a question with sampled frames and captions, forwards it to
//! Gemini, and normalizes the answer or error for the client.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use error::ApiError;
pub use models::{AskRequest, AskResponse, ErrorBody, HealthResponse};
pub use server::{router, AppState};

/// Proxy server handling the question and health endpoints
#[derive(Debug)]
pub struct ApiServer {
    config: Arc<Config>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Start the API server and run until shutdown
    pub async fn start(self) -> Result<()> {
        info!("🚀 Starting API server on port {}", self.config.server.port);
        server::start_http_server(self.config).await
    }
}
