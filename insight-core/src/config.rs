use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Explicit pipeline configuration. Built once at startup and passed
/// into each component at construction; no component reads process
/// environment state directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Identifying User-Agent sent with every upstream request.
    pub user_agent: String,
    pub reddit_base_url: String,
    pub cache_dir: PathBuf,
    /// Per-post comment fetch limit.
    pub comment_limit: u32,
    pub comment_sort: String,
    pub request_timeout_secs: u64,
    /// Fixed pacing delay between successive comment fetches.
    pub comment_delay_ms: u64,
    /// Bounded retry attempts for upstream calls.
    pub retry_max_attempts: u32,
    /// Base delay for exponential backoff between retries.
    pub retry_base_delay_ms: u64,
    /// When set, markdown normalization degrades short or empty blobs
    /// to placeholder posts instead of failing. Off by default: the
    /// lenient mode can mask real upstream failures.
    pub lenient_markdown: bool,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: "reddit-insight/0.1 (content research)".to_string(),
            reddit_base_url: "https://www.reddit.com".to_string(),
            cache_dir: PathBuf::from("data"),
            comment_limit: 20,
            comment_sort: "top".to_string(),
            request_timeout_secs: 30,
            comment_delay_ms: 500,
            retry_max_attempts: 3,
            retry_base_delay_ms: 2000,
            lenient_markdown: false,
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "user_agent".to_string(),
            });
        }
        if self.comment_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "comment_limit".to_string(),
                value: "0".to_string(),
            });
        }
        if self.retry_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_max_attempts".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
