//! One circuit breaker per dependency name

use super::config::CircuitBreakerConfig;
use super::state::CircuitBreaker;
use super::types::CircuitState;
use dashmap::DashMap;
use mercado_core::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;

/// Serializable view of a breaker for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: usize,
    pub success_count: usize,
    pub half_open_calls: usize,
    pub failure_threshold: usize,
    pub success_threshold: usize,
    pub reset_timeout_secs: u64,
    /// Remaining cooldown while open
    pub retry_after_ms: Option<u64>,
}

impl BreakerSnapshot {
    fn of(breaker: &CircuitBreaker) -> Self {
        let state = breaker.state();
        let stats = breaker.stats();
        let config = breaker.config();
        Self {
            name: breaker.name().to_string(),
            state,
            failure_count: stats.failure_count,
            success_count: stats.success_count,
            half_open_calls: stats.half_open_calls,
            failure_threshold: config.failure_threshold,
            success_threshold: config.success_threshold,
            reset_timeout_secs: config.reset_timeout.as_secs(),
            retry_after_ms: (state == CircuitState::Open)
                .then(|| breaker.retry_after().as_millis() as u64),
        }
    }
}

/// Owns every breaker; lookups create on first use
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    defaults: CircuitBreakerConfig,
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreakerRegistry {
    pub fn new(defaults: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            defaults,
        }
    }

    /// Existing breaker for `name`, or a new one with the registry defaults
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create_with(name, self.defaults.clone())
    }

    /// Existing breaker for `name`, or a new one with `config`.
    ///
    /// `config` is ignored when the breaker already exists.
    pub fn get_or_create_with(&self, name: &str, config: CircuitBreakerConfig) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(existing.value());
        }
        let breaker = self
            .breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!("Creating circuit breaker '{name}'");
                Arc::new(CircuitBreaker::new(name, config))
            });
        Arc::clone(breaker.value())
    }

    pub fn get(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|b| Arc::clone(b.value()))
    }

    /// Run `operation` through the breaker named `name`
    pub async fn call<F, Fut, T>(&self, name: &str, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let breaker = self.get_or_create(name);
        breaker.call(operation).await
    }

    /// Force a breaker closed; returns `false` for unknown names
    pub fn reset(&self, name: &str) -> bool {
        self.get(name).map(|breaker| breaker.reset()).is_some()
    }

    /// Snapshots sorted by name
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<BreakerSnapshot> = self
            .breakers
            .iter()
            .map(|entry| BreakerSnapshot::of(entry.value()))
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercado_core::Error;
    use std::time::Duration;

    #[tokio::test]
    async fn test_one_breaker_per_name() {
        let registry = CircuitBreakerRegistry::default();
        let a = registry.get_or_create("payments");
        let b = registry.get_or_create("payments");
        let _ = registry.get_or_create("shipping");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_custom_config_only_applies_on_creation() {
        let registry = CircuitBreakerRegistry::default();
        let custom = CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        };
        let first = registry.get_or_create_with("search", custom);
        let second = registry.get_or_create_with("search", CircuitBreakerConfig::default());

        assert_eq!(first.config().failure_threshold, 1);
        assert_eq!(second.config().failure_threshold, 1);
    }

    #[tokio::test]
    async fn test_call_snapshot_and_reset() {
        let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        for _ in 0..2 {
            let _: Result<()> = registry
                .call("payments", || async {
                    Err(Error::external_service("payments", "timeout"))
                })
                .await;
        }
        let ok: Result<u32> = registry.call("catalog", || async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let snapshot = registry.snapshot();
        let names: Vec<_> = snapshot.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["catalog", "payments"]);
        assert_eq!(snapshot[1].state, CircuitState::Open);
        assert!(snapshot[1].retry_after_ms.is_some());
        assert_eq!(snapshot[0].retry_after_ms, None);

        assert!(registry.reset("payments"));
        assert!(!registry.reset("unknown"));
        let breaker = registry.get("payments").unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.retry_after(), Duration::ZERO);
    }
}
