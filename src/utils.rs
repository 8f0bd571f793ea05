use tokio::time::{Duration, sleep};
use tracing::{debug, info, warn};

use crate::models::retry::RetryConfig;

/// Runs `operation` up to `config.max_attempts` times, sleeping between
/// attempts with exponential backoff and +/-10% jitter. The final error is
/// returned unchanged once attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay_ms = config.initial_delay_ms;

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    info!(attempt, "Operation succeeded after retrying");
                }
                return Ok(result);
            }
            Err(e) if attempt == max_attempts => {
                warn!(
                    max_attempts,
                    error = %e,
                    "Giving up after exhausting retry attempts"
                );
                return Err(e);
            }
            Err(e) => {
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %e,
                    "Attempt failed, backing off before retrying"
                );

                sleep(Duration::from_millis(jittered(delay_ms))).await;
                delay_ms = (delay_ms * config.backoff_multiplier).min(config.max_delay_ms);
            }
        }
    }

    unreachable!("retry loop always returns within max_attempts iterations")
}

fn jittered(delay_ms: u64) -> u64 {
    let factor = 1.0 + rand::random_range(-0.1..=0.1);
    (delay_ms as f64 * factor) as u64
}
