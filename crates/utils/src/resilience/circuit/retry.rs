//! Retry loops with exponential backoff.

use super::config::RetryConfig;
use super::state::CircuitBreaker;
use mercado_core::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Run `operation` until it succeeds, fails with an error the config does
/// not retry, or `max_retries` extra attempts are spent.
pub async fn retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    log::info!("Operation recovered on attempt {}", attempt + 1);
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if attempt >= config.max_retries || !config.should_retry(&error) {
            return Err(error);
        }

        let delay = backoff(config, attempt, &error);
        log::warn!(
            "Attempt {}/{} failed, next in {delay:?}: {error}",
            attempt + 1,
            config.max_retries + 1
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Retry through a breaker. Open-circuit rejections are transient, so the
/// loop waits out the breaker's cooldown hint (capped at `max_delay`)
/// instead of hammering it.
pub async fn retry_with_circuit_breaker<F, Fut, T>(
    retry_config: &RetryConfig,
    circuit_breaker: &CircuitBreaker,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry(retry_config, || circuit_breaker.call(&operation)).await
}

fn backoff(config: &RetryConfig, attempt: usize, error: &Error) -> Duration {
    let delay = config.calculate_delay(attempt);
    match error.peeled() {
        Error::CircuitOpen { retry_after, .. } => delay.max((*retry_after).min(config.max_delay)),
        _ => delay,
    }
}
