//! Typed cache facade over a [`CacheStore`]
//!
//! The service never lets a store problem reach the caller. Reads that fail
//! are misses, writes that fail return `false`, and every failure is logged
//! and counted. Correctness of the business result must not depend on the
//! cache being reachable.

use crate::codec::{Codec, CompressionConfig};
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::keys::validate_key;
use crate::stats::{CacheStats, CacheStatsSnapshot};
use crate::store::{CacheStore, MemoryStore};
use mercado_core::config::{CacheConfig, TtlPolicyConfig};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache service shared by all request handlers
#[derive(Debug, Clone)]
pub struct CacheService {
    inner: Arc<ServiceInner>,
}

#[derive(Debug)]
struct ServiceInner {
    store: Arc<dyn CacheStore>,
    codec: Codec,
    ttl_policy: TtlPolicyConfig,
    store_timeout: Duration,
    max_key_len: usize,
    stats: CacheStats,
}

impl CacheService {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                store,
                codec: Codec::new(CompressionConfig::from(config)),
                ttl_policy: config.ttl_policy.clone(),
                store_timeout: config.store_timeout(),
                max_key_len: config.max_key_len,
                stats: CacheStats::new(),
            }),
        }
    }

    /// Service over a fresh [`MemoryStore`]
    pub fn in_memory(config: &CacheConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.inner.store
    }

    pub fn codec(&self) -> &Codec {
        &self.inner.codec
    }

    /// Look up `key`; any failure is reported as a miss
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                self.inner.stats.record_hit();
                Some(value)
            }
            Ok(None) => {
                self.inner.stats.record_miss();
                None
            }
            Err(e) => {
                self.inner.stats.record_error();
                warn!(
                    key,
                    error_type = e.error_type(),
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                if e.is_corruption() {
                    self.discard_corrupt(key).await;
                }
                None
            }
        }
    }

    async fn try_get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        validate_key(key, self.inner.max_key_len)?;
        let payload = self
            .with_timeout("get", self.inner.store.get(key))
            .await?;
        payload
            .map(|bytes| self.inner.codec.decode(key, &bytes))
            .transpose()
    }

    async fn discard_corrupt(&self, key: &str) {
        if let Err(e) = self.with_timeout("delete", self.inner.store.delete(key)).await {
            debug!(key, error = %e, "Could not remove corrupt cache entry");
        }
    }

    /// Store `value` under `key`.
    ///
    /// `ttl = None` picks the TTL from the resource-class policy. Returns
    /// `false` if the value could not be stored.
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> bool
    where
        T: Serialize + ?Sized,
    {
        match self.try_set(key, value, ttl).await {
            Ok(()) => {
                self.inner.stats.record_set();
                true
            }
            Err(e) => self.write_failed("set", key, &e),
        }
    }

    async fn try_set<T>(&self, key: &str, value: &T, ttl: Option<Duration>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        validate_key(key, self.inner.max_key_len)?;
        let ttl = ttl.unwrap_or_else(|| self.ttl_for(key));
        if ttl.is_zero() {
            return Err(CacheError::InvalidKey {
                key: key.to_string(),
                reason: "TTL must be greater than zero".to_string(),
                recovery_hint: RecoveryHint::FixInput {
                    instructions: "Pass a positive TTL or None for the policy default"
                        .to_string(),
                },
            });
        }

        let encoded = self.inner.codec.encode(key, value)?;
        self.with_timeout(
            "set",
            self.inner.store.set_with_ttl(key, encoded.bytes, ttl),
        )
        .await?;

        if encoded.compressed {
            self.inner.stats.record_compression(encoded.bytes_saved);
        }
        Ok(())
    }

    /// Remove `key`; `true` only if an entry was actually removed
    pub async fn delete(&self, key: &str) -> bool {
        let result = match validate_key(key, self.inner.max_key_len) {
            Ok(()) => self.with_timeout("delete", self.inner.store.delete(key)).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(removed) => {
                if removed {
                    self.inner.stats.record_deletes(1);
                }
                removed
            }
            Err(e) => self.write_failed("delete", key, &e),
        }
    }

    /// Remove every key matching a glob pattern, returning how many went
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let keys = match self
            .with_timeout("keys_matching", self.inner.store.keys_matching(pattern))
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                self.write_failed("delete_pattern", pattern, &e);
                return 0;
            }
        };

        let mut removed = 0;
        for key in &keys {
            match self.with_timeout("delete", self.inner.store.delete(key)).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    self.write_failed("delete", key, &e);
                }
            }
        }

        self.inner.stats.record_deletes(removed as u64);
        debug!(pattern, matched = keys.len(), removed, "Invalidated cache pattern");
        removed
    }

    pub async fn exists(&self, key: &str) -> bool {
        let result = match validate_key(key, self.inner.max_key_len) {
            Ok(()) => self.with_timeout("exists", self.inner.store.exists(key)).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| self.write_failed("exists", key, &e))
    }

    /// Reset the TTL of an existing entry
    pub async fn extend_ttl(&self, key: &str, ttl: Duration) -> bool {
        let result = match validate_key(key, self.inner.max_key_len) {
            Ok(()) => self.with_timeout("expire", self.inner.store.expire(key, ttl)).await,
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| self.write_failed("extend_ttl", key, &e))
    }

    /// Add `delta` to an integer counter, `None` if the store cannot
    pub async fn increment(&self, key: &str, delta: i64) -> Option<i64> {
        let result = match validate_key(key, self.inner.max_key_len) {
            Ok(()) => {
                self.with_timeout("increment", self.inner.store.increment(key, delta))
                    .await
            }
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.write_failed("increment", key, &e);
                None
            }
        }
    }

    /// TTL the policy assigns to `key`
    pub fn ttl_for(&self, key: &str) -> Duration {
        self.inner.ttl_policy.ttl_for_key(key)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Whether the store answers a ping within the call budget
    pub async fn health(&self) -> bool {
        match self.with_timeout("ping", self.inner.store.ping()).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Cache store health check failed");
                false
            }
        }
    }

    /// Ask the store to drop expired entries; a store that overruns the
    /// call budget purges nothing
    pub async fn purge_expired(&self) -> usize {
        let purge = async { Ok(self.inner.store.purge_expired().await) };
        match self.with_timeout("purge_expired", purge).await {
            Ok(purged) => {
                if purged > 0 {
                    debug!(purged, "Purged expired cache entries");
                }
                purged
            }
            Err(e) => {
                warn!(error = %e, "Cache purge did not finish");
                0
            }
        }
    }

    fn write_failed(&self, operation: &'static str, key: &str, error: &CacheError) -> bool {
        self.inner.stats.record_error();
        warn!(
            operation,
            key,
            error_type = error.error_type(),
            error = %error,
            "Cache operation failed"
        );
        false
    }

    async fn with_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let budget = self.inner.store_timeout;
        tokio::time::timeout(budget, fut)
            .await
            .map_err(|_| CacheError::Timeout {
                operation,
                duration: budget,
                recovery_hint: RecoveryHint::Retry {
                    after: Duration::from_millis(100),
                },
            })?
    }
}
