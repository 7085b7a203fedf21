//! Cache store abstraction
//!
//! The store is the only component that holds cached bytes. It is expected
//! to replace values atomically per key and to own TTL expiry.

mod memory;
mod unavailable;

pub use memory::MemoryStore;
pub use unavailable::UnavailableStore;

use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Key/value store with TTL and pattern lookup
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Fetch the payload for `key`, `None` if absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove `key`; `Ok(false)` if it did not exist
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Live keys matching a glob pattern such as `product:*`
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>>;

    async fn exists(&self, key: &str) -> Result<bool>;

    /// Reset the TTL of an existing key; `Ok(false)` if it did not exist
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Atomically add `delta` to an integer counter stored at `key`
    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        let _ = (key, delta);
        Err(CacheError::Unsupported {
            operation: "increment",
            store_type: self.store_type(),
            recovery_hint: RecoveryHint::NoRecovery,
        })
    }

    /// Cheap liveness probe
    async fn ping(&self) -> Result<()>;

    /// Drop expired entries eagerly; stores with native expiry return 0
    async fn purge_expired(&self) -> usize {
        0
    }

    fn store_type(&self) -> StoreType;
}
