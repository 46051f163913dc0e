use insight_core::{AppConfig, CoreError, ErrorExt, RedditApiError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first try included)
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000, // Start with 2 seconds for the Reddit API
            max_delay_ms: 60000, // Max 1 minute delay
            backoff_multiplier: 2.0,
            jitter_factor: 0.2, // 20% jitter to prevent thundering herd
        }
    }
}

impl RetryConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            base_delay_ms: config.retry_base_delay_ms,
            ..Default::default()
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after a server-specified delay (rate limits)
    RetryWithDelay(Duration),
    /// Don't retry (access failures and other permanent errors)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    match error {
        CoreError::RedditApi(reddit_error) => match reddit_error {
            RedditApiError::RateLimitExceeded { retry_after } => {
                RetryStrategy::RetryWithDelay(Duration::from_secs(*retry_after))
            }
            // Server errors and timeouts are usually transient
            RedditApiError::ServerError { .. } => RetryStrategy::Retry,
            RedditApiError::RequestTimeout => RetryStrategy::Retry,
            RedditApiError::InvalidResponse { .. } => RetryStrategy::Retry,
            // Forbidden or missing subreddits fail immediately
            RedditApiError::Forbidden { .. } => RetryStrategy::NoRetry,
            RedditApiError::SubredditNotFound { .. } => RetryStrategy::NoRetry,
        },
        CoreError::Network(reqwest_error) => {
            if reqwest_error.is_timeout() || reqwest_error.is_connect() {
                RetryStrategy::Retry
            } else {
                RetryStrategy::NoRetry
            }
        }
        _ => RetryStrategy::NoRetry,
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let base_delay = Duration::from_millis(config.base_delay_ms);
    let max_delay = Duration::from_millis(config.max_delay_ms);

    let exponential_delay = if attempt == 0 {
        base_delay
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    final_delay.min(max_delay)
}

/// Retry metrics for monitoring
#[derive(Debug, Clone, Default)]
pub struct RetryMetrics {
    pub total_retries: u64,
    pub successful_retries: u64,
    pub failed_operations: u64,
}

/// Retry executor that wraps upstream calls with bounded retries.
/// After exhausting attempts the last classified error is surfaced
/// unchanged so callers can still tell access failures apart from
/// transport failures.
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
    metrics: Arc<Mutex<RetryMetrics>>,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(Mutex::new(RetryMetrics::default())),
        }
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut last_error: Option<CoreError> = None;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation_name);
            }

            let start_time = Instant::now();
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        let mut metrics = self.metrics.lock().unwrap();
                        metrics.total_retries += attempt as u64;
                        metrics.successful_retries += 1;
                        info!(
                            "Operation {} succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(err) => {
                    debug!(
                        "Attempt {} failed for {} after {:?}: {}",
                        attempt + 1,
                        operation_name,
                        start_time.elapsed(),
                        err
                    );

                    let strategy = get_retry_strategy(&err);
                    let attempts_left = attempt + 1 < self.config.max_attempts;

                    match strategy {
                        RetryStrategy::NoRetry => {
                            debug!("Not retrying {} due to error type: {}", operation_name, err);
                            last_error = Some(err);
                            break;
                        }
                        RetryStrategy::Retry if attempts_left => {
                            let delay = calculate_delay(attempt, &self.config);
                            info!("Retrying {} in {:?} due to: {}", operation_name, delay, err);
                            last_error = Some(err);
                            sleep(delay).await;
                        }
                        RetryStrategy::RetryWithDelay(delay) if attempts_left => {
                            info!(
                                "Retrying {} after specified delay of {:?} due to: {}",
                                operation_name, delay, err
                            );
                            last_error = Some(err);
                            sleep(delay).await;
                        }
                        _ => {
                            debug!("Max retry attempts reached for {}", operation_name);
                            last_error = Some(err);
                            break;
                        }
                    }
                }
            }
        }

        {
            let mut metrics = self.metrics.lock().unwrap();
            metrics.failed_operations += 1;
        }

        let error = last_error.unwrap_or_else(|| CoreError::Internal {
            message: format!("{} produced no result", operation_name),
        });
        error!(
            "Operation {} failed after {} attempts: {} (code {})",
            operation_name,
            self.config.max_attempts,
            error,
            error.error_code()
        );
        Err(error)
    }

    /// Get current retry metrics
    pub fn get_metrics(&self) -> RetryMetrics {
        self.metrics.lock().unwrap().clone()
    }
}
