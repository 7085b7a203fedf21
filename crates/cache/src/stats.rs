//! Cache operation counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Shared hit/miss/error counters.
///
/// Cloning is cheap and all clones observe the same counters.
#[derive(Debug, Clone)]
pub struct CacheStats {
    inner: Arc<StatsInner>,
}

#[derive(Debug)]
struct StatsInner {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
    bytes_saved: AtomicU64,
    compressed_writes: AtomicU64,
    started: Instant,
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StatsInner {
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                sets: AtomicU64::new(0),
                deletes: AtomicU64::new(0),
                errors: AtomicU64::new(0),
                bytes_saved: AtomicU64::new(0),
                compressed_writes: AtomicU64::new(0),
                started: Instant::now(),
            }),
        }
    }

    pub fn record_hit(&self) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.inner.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deletes(&self, count: u64) {
        self.inner.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.inner.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one compressed write and the bytes it saved
    pub fn record_compression(&self, bytes_saved: u64) {
        self.inner.compressed_writes.fetch_add(1, Ordering::Relaxed);
        self.inner.bytes_saved.fetch_add(bytes_saved, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        let hits = self.inner.hits.load(Ordering::Relaxed);
        let misses = self.inner.misses.load(Ordering::Relaxed);
        CacheStatsSnapshot {
            hits,
            misses,
            sets: self.inner.sets.load(Ordering::Relaxed),
            deletes: self.inner.deletes.load(Ordering::Relaxed),
            errors: self.inner.errors.load(Ordering::Relaxed),
            bytes_saved: self.inner.bytes_saved.load(Ordering::Relaxed),
            compressed_writes: self.inner.compressed_writes.load(Ordering::Relaxed),
            total_lookups: hits + misses,
            hit_rate_pct: hit_rate_pct(hits, misses),
            uptime: self.inner.started.elapsed(),
        }
    }
}

fn hit_rate_pct(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64 * 100.0
    }
}

/// Serializable view of [`CacheStats`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
    pub bytes_saved: u64,
    pub compressed_writes: u64,
    pub total_lookups: u64,
    /// Hits over hits plus misses, 0 when nothing was looked up
    pub hit_rate_pct: f64,
    #[serde(with = "duration_secs")]
    pub uptime: Duration,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::new();
        assert_eq!(stats.snapshot().hit_rate_pct, 0.0);

        for _ in 0..3 {
            stats.record_hit();
        }
        stats.record_miss();

        let snap = stats.snapshot();
        assert_eq!(snap.total_lookups, 4);
        assert!((snap.hit_rate_pct - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let stats = CacheStats::new();
        let other = stats.clone();
        other.record_compression(100);
        other.record_compression(50);
        other.record_deletes(3);

        let snap = stats.snapshot();
        assert_eq!(snap.bytes_saved, 150);
        assert_eq!(snap.compressed_writes, 2);
        assert_eq!(snap.deletes, 3);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let stats = CacheStats::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                let stats = stats.clone();
                scope.spawn(move || {
                    for _ in 0..1000 {
                        stats.record_hit();
                    }
                });
            }
        });
        assert_eq!(stats.snapshot().hits, 8000);
    }
}
