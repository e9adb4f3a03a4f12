use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the video Q&A proxy and sampler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Upstream Gemini API settings
    pub gemini: GeminiConfig,

    /// Frame sampler settings
    pub sampler: SamplerConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Directory holding the static entry page
    pub static_dir: PathBuf,

    /// Maximum accepted request body in megabytes
    pub body_limit_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key, normally taken from GEMINI_API_KEY
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Base URL of the generative language API
    pub endpoint: String,

    /// Model name used in the generateContent path
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// JPEG quality in (0, 1]
    pub jpeg_quality: f32,

    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable
    pub ffprobe_path: PathBuf,

    /// Base URL of the proxy the sampler submits to
    pub proxy_url: String,

    /// Speech-to-text used when a video has no subtitle file
    #[serde(default)]
    pub transcription: TranscriptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    /// Whisper executable
    pub whisper_path: PathBuf,

    /// Whisper model name (tiny, base, small, medium, large)
    pub model: String,

    /// Spoken language; detected when unset
    pub language: Option<String>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            whisper_path: PathBuf::from("whisper"),
            model: "base".to_string(),
            language: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    pub level: String,
}

impl GeminiConfig {
    /// True when a non-empty API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl Config {
    /// Load configuration from the first config file found, then apply the environment
    pub fn load() -> Result<Self> {
        let config_paths = ["video-qa.toml", "config/video-qa.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                return Self::load_from(path);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Self::from_env(Self::default())
    }

    /// Load configuration from a specific TOML file, then apply the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Self::from_env(config)
    }

    /// Override a base configuration with environment variables
    pub fn from_env(mut config: Self) -> Result<Self> {
        if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
            config.gemini.api_key = Some(api_key);
        }

        if let Ok(port) = std::env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|e| anyhow!("Invalid PORT value {:?}: {}", port, e))?;
        }

        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.gemini.model = model;
        }

        if let Ok(endpoint) = std::env::var("GEMINI_ENDPOINT") {
            config.gemini.endpoint = endpoint;
        }

        if let Ok(static_dir) = std::env::var("VIDEO_QA_STATIC_DIR") {
            config.server.static_dir = PathBuf::from(static_dir);
        }

        if let Ok(proxy_url) = std::env::var("VIDEO_QA_PROXY_URL") {
            config.sampler.proxy_url = proxy_url;
        }

        if let Ok(model) = std::env::var("VIDEO_QA_WHISPER_MODEL") {
            config.sampler.transcription.model = model;
        }

        if let Ok(log_level) = std::env::var("VIDEO_QA_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.body_limit_mb == 0 {
            return Err(anyhow!("body_limit_mb must be greater than 0"));
        }

        if !(self.sampler.jpeg_quality > 0.0 && self.sampler.jpeg_quality <= 1.0) {
            return Err(anyhow!(
                "jpeg_quality must be in (0, 1], got {}",
                self.sampler.jpeg_quality
            ));
        }

        for (name, url) in [
            ("gemini.endpoint", &self.gemini.endpoint),
            ("sampler.proxy_url", &self.sampler.proxy_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(anyhow!("{} must be an http(s) URL, got {:?}", name, url));
            }
        }

        if self.gemini.model.trim().is_empty() {
            return Err(anyhow!("gemini.model must not be empty"));
        }

        if self.sampler.transcription.model.trim().is_empty() {
            return Err(anyhow!("sampler.transcription.model must not be empty"));
        }

        Ok(())
    }

    /// Body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.server.body_limit_mb * 1024 * 1024
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Video Q&A Configuration:\n\
            - Listen: {}:{}\n\
            - Static Directory: {}\n\
            - Body Limit: {} MB\n\
            - Gemini Model: {}\n\
            - Gemini Endpoint: {}\n\
            - API Key Configured: {}\n\
            - Proxy URL: {}",
            self.server.host,
            self.server.port,
            self.server.static_dir.display(),
            self.server.body_limit_mb,
            self.gemini.model,
            self.gemini.endpoint,
            self.gemini.has_api_key(),
            self.sampler.proxy_url,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                static_dir: PathBuf::from("public"),
                body_limit_mb: 50,
            },
            gemini: GeminiConfig {
                api_key: None,
                endpoint: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-1.5-flash".to_string(),
            },
            sampler: SamplerConfig {
                jpeg_quality: 0.5,
                ffmpeg_path: PathBuf::from("ffmpeg"),
                ffprobe_path: PathBuf::from("ffprobe"),
                proxy_url: "http://localhost:3000".to_string(),
                transcription: TranscriptionConfig::default(),
            },
            logging: LoggingConfig {
                level: "video_qa=info,tower_http=info".to_string(),
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.config.server.static_dir = dir;
        self
    }

    pub fn with_body_limit_mb(mut self, limit_mb: usize) -> Self {
        self.config.server.body_limit_mb = limit_mb;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.gemini.api_key = Some(api_key.into());
        self
    }

    pub fn without_api_key(mut self) -> Self {
        self.config.gemini.api_key = None;
        self
    }

    pub fn with_gemini_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.gemini.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.gemini.model = model.into();
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.config.sampler.proxy_url = url.into();
        self
    }

    pub fn with_jpeg_quality(mut self, quality: f32) -> Self {
        self.config.sampler.jpeg_quality = quality;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
