//! In-process store backed by a sharded map

use super::CacheStore;
use crate::errors::{CacheError, RecoveryHint, Result, StoreType};
use async_trait::async_trait;
use dashmap::DashMap;
use globset::Glob;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Arc<[u8]>,
    expires_at: Instant,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Single-node store for tests, the CLI and small deployments.
///
/// Expired entries are invisible immediately and physically removed on
/// access or by [`CacheStore::purge_expired`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn live_entry(&self, key: &str) -> Option<MemoryEntry> {
        let now = Instant::now();
        let entry = self.entries.get(key).map(|e| e.value().clone())?;
        if entry.is_live(now) {
            Some(entry)
        } else {
            self.entries
                .remove_if(key, |_, current| !current.is_live(now));
            None
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.live_entry(key).map(|entry| entry.value.to_vec()))
    }

    async fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: Arc::from(value),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .is_some_and(|(_, entry)| entry.is_live(now)))
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let matcher = Glob::new(pattern)
            .map_err(|e| CacheError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
                recovery_hint: RecoveryHint::FixInput {
                    instructions: "Use glob syntax such as 'product:*'".to_string(),
                },
            })?
            .compile_matcher();

        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_live(now) && matcher.is_match(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live_entry(key).is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = Instant::now();
        match self.entries.get_mut(key) {
            Some(mut entry) if entry.is_live(now) => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment(&self, key: &str, delta: i64) -> Result<i64> {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| MemoryEntry {
                value: Arc::from(b"0".as_slice()),
                expires_at: now + Duration::from_secs(u32::MAX as u64),
            });
        if !entry.is_live(now) {
            entry.value = Arc::from(b"0".as_slice());
            entry.expires_at = now + Duration::from_secs(u32::MAX as u64);
        }

        let current: i64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| CacheError::Corruption {
                key: key.to_string(),
                reason: "value is not an integer counter".to_string(),
                recovery_hint: RecoveryHint::ClearAndRetry,
            })?;
        let next = current.saturating_add(delta);
        entry.value = Arc::from(next.to_string().into_bytes());
        Ok(next)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    fn store_type(&self) -> StoreType {
        StoreType::Memory
    }
}
