//! Store that refuses every call

use super::CacheStore;
use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use async_trait::async_trait;
use std::time::Duration;

/// Stand-in for a backend that cannot be reached.
///
/// Every call fails with [`CacheError::StoreUnavailable`], which makes the
/// cache service behave as a permanent miss.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> CacheError {
        CacheError::StoreUnavailable {
            store_type: self.store_type(),
            reason: self.reason.clone(),
            recovery_hint: RecoveryHint::UseFallback,
        }
    }
}

impl Default for UnavailableStore {
    fn default() -> Self {
        Self::new("no cache backend configured")
    }
}

#[async_trait]
impl CacheStore for UnavailableStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(self.error())
    }

    async fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
        Err(self.error())
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(self.error())
    }

    async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>> {
        Err(self.error())
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Err(self.error())
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool> {
        Err(self.error())
    }

    async fn ping(&self) -> Result<()> {
        Err(self.error())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Custom("unavailable".to_string())
    }
}
