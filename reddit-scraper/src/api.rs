use crate::pacing::{PacingPolicy, RateHeaders};
use crate::retry::{RetryConfig, RetryExecutor};
use insight_core::{AppConfig, CoreError, RedditApiError, SourceId};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// HTTP client for the public Reddit JSON endpoints. All calls go
/// through the retry executor; header-driven pacing is applied after
/// each successful response, independent of retries.
#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    base_url: String,
    pacing: PacingPolicy,
    retry: RetryExecutor,
}

impl RedditApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.reddit_base_url.trim_end_matches('/').to_string(),
            pacing: PacingPolicy::from_app_config(config),
            retry: RetryExecutor::new(RetryConfig::from_app_config(config)),
        })
    }

    /// Fixed delay to insert between successive comment fetches.
    pub fn comment_delay(&self) -> Duration {
        self.pacing.comment_delay
    }

    pub async fn fetch_listing(&self, source: &SourceId) -> Result<Value, CoreError> {
        let url = format!("{}/r/{}/hot.json", self.base_url, source.as_str());
        info!("Fetching listing for {}", source);
        self.retry
            .execute("fetch_listing", || self.get_json(&url, source))
            .await
    }

    pub async fn fetch_comments(
        &self,
        source: &SourceId,
        post_id: &str,
        limit: u32,
        sort: &str,
    ) -> Result<Value, CoreError> {
        let url = format!(
            "{}/r/{}/comments/{}.json?limit={}&sort={}",
            self.base_url,
            source.as_str(),
            post_id,
            limit,
            sort
        );
        debug!("Fetching comments for post {} in {}", post_id, source);
        self.retry
            .execute("fetch_comments", || self.get_json(&url, source))
            .await
    }

    async fn get_json(&self, url: &str, source: &SourceId) -> Result<Value, CoreError> {
        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Network error for GET {}: {}", url, e);
                if e.is_timeout() {
                    return Err(RedditApiError::RequestTimeout.into());
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Request failed with status {} for {}", status, url);
            return Err(classify_status(status, response.headers(), source).into());
        }

        // Pace ourselves when the window is nearly spent
        if let Some(rate) = RateHeaders::parse(response.headers()) {
            if let Some(delay) = self.pacing.header_delay(&rate) {
                sleep(delay).await;
            }
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| RedditApiError::InvalidResponse {
                details: format!("Failed to parse JSON from {}: {}", url, e),
            })?;
        Ok(value)
    }
}

fn classify_status(status: StatusCode, headers: &HeaderMap, source: &SourceId) -> RedditApiError {
    match status.as_u16() {
        429 => {
            let retry_after = headers
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(60);
            RedditApiError::RateLimitExceeded { retry_after }
        }
        403 => RedditApiError::Forbidden {
            subreddit: source.as_str().to_string(),
        },
        404 => RedditApiError::SubredditNotFound {
            subreddit: source.as_str().to_string(),
        },
        code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
        code => RedditApiError::InvalidResponse {
            details: format!("Unexpected status {}", code),
        },
    }
}
