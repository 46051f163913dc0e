use insight_core::AppConfig;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::debug;

/// Rate-limit accounting reported by Reddit on every response.
#[derive(Debug, Clone, PartialEq)]
pub struct RateHeaders {
    /// Requests left in the current window
    pub remaining: f64,
    /// Requests already spent in the current window
    pub used: f64,
    /// Seconds until the window resets
    pub reset_secs: f64,
}

impl RateHeaders {
    pub fn parse(headers: &HeaderMap) -> Option<Self> {
        let value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
        };

        Some(Self {
            remaining: value("x-ratelimit-remaining")?,
            used: value("x-ratelimit-used").unwrap_or(0.0),
            reset_secs: value("x-ratelimit-reset")?,
        })
    }
}

/// Pacing policy independent of the retry mechanism: header-driven
/// slow-down near the window limit, plus a fixed delay between
/// successive comment fetches within one listing fetch. The two rate
/// controls stay separate so their arithmetic never compounds.
#[derive(Debug, Clone)]
pub struct PacingPolicy {
    /// Below this many remaining requests, start spreading calls out.
    pub remaining_threshold: f64,
    /// Upper bound on any single header-driven sleep.
    pub max_delay: Duration,
    /// Fixed delay between per-post comment fetches.
    pub comment_delay: Duration,
}

impl PacingPolicy {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            remaining_threshold: 10.0,
            max_delay: Duration::from_secs(10),
            comment_delay: Duration::from_millis(config.comment_delay_ms),
        }
    }

    /// Delay derived from the remaining-capacity headers: spread the
    /// rest of the window evenly over the remaining requests. `None`
    /// while capacity is comfortable.
    pub fn header_delay(&self, headers: &RateHeaders) -> Option<Duration> {
        if headers.remaining >= self.remaining_threshold {
            return None;
        }
        let secs = headers.reset_secs / headers.remaining.max(1.0);
        let delay = Duration::from_secs_f64(secs.max(0.0)).min(self.max_delay);
        debug!(
            "Rate headers low (remaining {}, used {}), pacing {:?}",
            headers.remaining, headers.used, delay
        );
        Some(delay)
    }
}
