//! Monitored futures and cache-aside helpers

use crate::context::PerformanceContext;
use crate::scope::{tags, Tags};
use mercado_cache::key_prefix;
use mercado_core::{Result, CACHE_LOOKUP_OPERATION, TAG_RESULT};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, Instrument};

impl PerformanceContext {
    /// Run `future` inside a monitored scope.
    ///
    /// The result is returned unchanged. Dropping the returned future before
    /// it resolves still records the operation as `cancelled`.
    pub async fn monitor<T, F>(&self, name: &str, tags: Tags, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let scope = self.monitor_operation(name, tags);
        let span = scope.span().clone();
        let result = future.instrument(span).await;
        match &result {
            Ok(_) => {
                scope.complete();
            }
            Err(e) => {
                scope.fail(e);
            }
        }
        result
    }

    /// Return the cached value for `key` or compute and store it.
    ///
    /// Cache failures fall through to `compute`. Errors from `compute`
    /// propagate unchanged and nothing is stored. `ttl = None` uses the
    /// resource-class policy.
    pub async fn get_cached_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        let value = self
            .monitor(&compute_operation(key), Tags::new(), compute())
            .await?;
        self.inner.cache.set(key, &value, ttl).await;
        Ok(value)
    }

    /// Cache-aside for computations that cannot fail
    pub async fn cached<T, F, Fut>(&self, key: &str, ttl: Option<Duration>, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(value) = self.lookup(key).await {
            return value;
        }

        let scope = self.monitor_operation(&compute_operation(key), Tags::new());
        let span = scope.span().clone();
        let value = compute().instrument(span).await;
        scope.complete();

        self.inner.cache.set(key, &value, ttl).await;
        value
    }

    /// Drop every cached key matching a glob such as `product:*`
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let removed = self.inner.cache.delete_pattern(pattern).await;
        info!(pattern, removed, "Invalidated cache entries");
        removed
    }

    async fn lookup<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let started = Instant::now();
        let value = self.inner.cache.get::<T>(key).await;
        let result = if value.is_some() { "hit" } else { "miss" };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.inner.metrics.record_sample(
            CACHE_LOOKUP_OPERATION,
            elapsed_ms,
            tags([(TAG_RESULT, result), ("prefix", key_prefix(key))]),
        );
        self.inner.exporter.record_cache_lookup(result);
        value
    }
}

fn compute_operation(key: &str) -> String {
    format!("compute:{}", key_prefix(key))
}
