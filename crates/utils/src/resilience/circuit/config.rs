//! Retry and breaker settings

use super::types::RetryOn;
use mercado_core::config::BreakerSettings;
use mercado_core::Error;
use rand::Rng;
use std::time::Duration;

/// Backoff policy for [`retry`](super::retry)
///
/// Delay for attempt `n` (zero-based) is `base_delay * 2^n`, capped at
/// `max_delay`, then spread by up to `jitter_factor` in either direction.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// 0.0 disables jitter; 0.2 spreads delays by up to 20%
    pub jitter_factor: f64,
    pub retry_on: RetryOn,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter_factor: 0.1,
            retry_on: RetryOn::Transient,
        }
    }
}

impl RetryConfig {
    /// Payments, shipping and search providers: patient, widely spread
    pub fn for_external_service() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.2,
            retry_on: RetryOn::ExternalService,
        }
    }

    /// Database queries: a couple of quick attempts, then give up
    pub fn for_database() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            ..Self::default()
        }
    }

    pub fn should_retry(&self, error: &Error) -> bool {
        match &self.retry_on {
            RetryOn::All => true,
            RetryOn::ExternalService => matches!(
                error.peeled(),
                Error::ExternalService { .. } | Error::Timeout { .. }
            ),
            RetryOn::Transient => error.is_transient(),
            RetryOn::Custom(predicate) => predicate(error),
        }
    }

    pub fn calculate_delay(&self, attempt: usize) -> Duration {
        let doublings = u32::try_from(attempt).unwrap_or(u32::MAX).min(31);
        let capped = self
            .base_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay);
        if self.jitter_factor <= 0.0 {
            return capped;
        }

        let spread = rand::thread_rng().gen_range(-self.jitter_factor..=self.jitter_factor);
        capped.mul_f64((1.0 + spread).max(0.0))
    }
}

/// Thresholds for one breaker; see [`BreakerSettings`] for the file form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit
    pub failure_threshold: usize,
    /// Success threshold to close the circuit from half-open state
    pub success_threshold: usize,
    /// Failures older than this stop counting toward the threshold
    pub failure_window: Duration,
    /// Time since the last failure before a half-open trial is allowed
    pub reset_timeout: Duration,
    /// Maximum number of requests in half-open state
    pub half_open_max_calls: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            failure_window: Duration::from_secs(60),
            reset_timeout: Duration::from_secs(60),
            half_open_max_calls: 3,
        }
    }
}

impl From<&BreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &BreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold as usize,
            success_threshold: settings.success_threshold as usize,
            failure_window: Duration::from_secs(settings.failure_window_secs),
            reset_timeout: Duration::from_secs(settings.reset_timeout_secs),
            half_open_max_calls: settings.half_open_max_calls as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_calculate_delay_with_jitter() {
        let config = RetryConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(1),
            jitter_factor: 0.5,
            ..Default::default()
        };

        let delays: Vec<_> = (0..20).map(|_| config.calculate_delay(2)).collect();

        let unique_delays: HashSet<_> = delays.iter().collect();
        assert!(unique_delays.len() > 1);

        // 400ms +/- 50%
        for delay in delays {
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(600));
        }
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            jitter_factor: 0.0,
            ..Default::default()
        };
        assert_eq!(config.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(config.calculate_delay(3), Duration::from_millis(800));
        assert_eq!(config.calculate_delay(40), Duration::from_secs(2));
    }

    #[test]
    fn test_should_retry_policies() {
        let transient = RetryConfig::default();
        assert!(transient.should_retry(&Error::timeout("quote", Duration::from_secs(1))));
        assert!(!transient.should_retry(&Error::validation("qty", "negative")));
        assert!(!transient.should_retry(&Error::database("insert", "foreign key violation")));

        let external = RetryConfig::for_external_service();
        assert!(external.should_retry(&Error::external_service("shipping", "502")));
        assert!(!external.should_retry(&Error::database("select", "connection reset")));
    }

    #[test]
    fn test_from_settings() {
        let config = CircuitBreakerConfig::from(&BreakerSettings::default());
        assert_eq!(config, CircuitBreakerConfig::default());
    }
}
