//! Samples and hour buckets

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seconds per aggregation bucket
pub const BUCKET_SECS: i64 = 3600;

/// One timed execution of an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub operation: String,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl MetricSample {
    pub fn bucket(&self) -> i64 {
        hour_bucket(self.timestamp)
    }
}

/// Wall-clock hour a timestamp falls into
pub fn hour_bucket(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp().div_euclid(BUCKET_SECS)
}

/// `now` minus `hours`, saturating at the earliest representable instant
pub fn hours_before(now: DateTime<Utc>, hours: u64) -> DateTime<Utc> {
    i64::try_from(hours)
        .ok()
        .and_then(ChronoDuration::try_hours)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Running aggregate of every sample in one hour.
///
/// The average is derived from `sum_ms / count` on read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBucket {
    pub count: u64,
    pub sum_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl Default for MetricBucket {
    fn default() -> Self {
        Self {
            count: 0,
            sum_ms: 0.0,
            min_ms: f64::INFINITY,
            max_ms: f64::NEG_INFINITY,
        }
    }
}

impl MetricBucket {
    pub fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        self.sum_ms += duration_ms;
        self.min_ms = self.min_ms.min(duration_ms);
        self.max_ms = self.max_ms.max(duration_ms);
    }

    /// Fold another bucket into this one
    pub fn merge(&mut self, other: &MetricBucket) {
        self.count += other.count;
        self.sum_ms += other.sum_ms;
        self.min_ms = self.min_ms.min(other.min_ms);
        self.max_ms = self.max_ms.max(other.max_ms);
    }

    pub fn avg_ms(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        // float summation can land a hair outside [min, max]
        Some((self.sum_ms / self.count as f64).clamp(self.min_ms, self.max_ms))
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
