//! Per-operation duration aggregation
//!
//! Every sample lands in two places: an hour bucket holding
//! `{count, sum, min, max}` for long-range summaries, and a bounded raw
//! sample list used for exact percentiles over the recent past.

use crate::sample::{hour_bucket, hours_before, MetricBucket, MetricSample};
use crate::summary::{percentile, MetricSummary};
use crate::system::{SysinfoCollector, SystemCollector, SystemSnapshot};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use mercado_core::config::MetricsConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// Retention and smoothing knobs
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatorConfig {
    pub raw_sample_retention_hours: u32,
    pub aggregate_retention_days: u32,
    pub max_samples_per_operation: usize,
    pub ema_alpha: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from(&MetricsConfig::default())
    }
}

impl From<&MetricsConfig> for AggregatorConfig {
    fn from(config: &MetricsConfig) -> Self {
        Self {
            raw_sample_retention_hours: u32::try_from(config.raw_sample_retention_hours)
                .unwrap_or(u32::MAX),
            aggregate_retention_days: u32::try_from(config.aggregate_retention_days)
                .unwrap_or(u32::MAX),
            max_samples_per_operation: config.max_samples_per_operation.max(1),
            ema_alpha: config.ema_alpha,
        }
    }
}

#[derive(Debug, Default)]
struct Series {
    samples: VecDeque<MetricSample>,
    /// Newest timestamp among samples evicted by the cap
    last_evicted: Option<DateTime<Utc>>,
    ema_ms: Option<f64>,
}

/// Counts returned by [`MetricsAggregator::purge_expired`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeReport {
    pub buckets: usize,
    pub samples: usize,
}

/// Concurrent duration aggregator
pub struct MetricsAggregator {
    config: AggregatorConfig,
    buckets: DashMap<(String, i64), MetricBucket>,
    series: DashMap<String, Series>,
    system: Arc<dyn SystemCollector>,
}

impl MetricsAggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self::with_collector(config, Arc::new(SysinfoCollector::new()))
    }

    pub fn with_collector(config: AggregatorConfig, system: Arc<dyn SystemCollector>) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
            series: DashMap::new(),
            system,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Record a sample timestamped now.
    ///
    /// Returns `false` if the duration was rejected.
    pub fn record_sample(
        &self,
        operation: &str,
        duration_ms: f64,
        tags: BTreeMap<String, String>,
    ) -> bool {
        self.record_sample_at(operation, duration_ms, tags, Utc::now())
    }

    pub fn record_sample_at(
        &self,
        operation: &str,
        duration_ms: f64,
        tags: BTreeMap<String, String>,
        timestamp: DateTime<Utc>,
    ) -> bool {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            debug!(operation, duration_ms, "Ignoring invalid duration sample");
            return false;
        }

        let sample = MetricSample {
            operation: operation.to_string(),
            duration_ms,
            timestamp,
            tags,
        };

        self.buckets
            .entry((sample.operation.clone(), sample.bucket()))
            .or_default()
            .record(duration_ms);

        let alpha = self.config.ema_alpha;
        let mut series = self.series.entry(sample.operation.clone()).or_default();
        series.ema_ms = Some(match series.ema_ms {
            Some(previous) => alpha * duration_ms + (1.0 - alpha) * previous,
            None => duration_ms,
        });
        series.samples.push_back(sample);
        while series.samples.len() > self.config.max_samples_per_operation {
            if let Some(evicted) = series.samples.pop_front() {
                series.last_evicted = Some(
                    series
                        .last_evicted
                        .map_or(evicted.timestamp, |t| t.max(evicted.timestamp)),
                );
            }
        }
        true
    }

    /// Summary of the last `window_hours` hours, `None` without samples
    pub fn summary(&self, operation: &str, window_hours: u32) -> Option<MetricSummary> {
        self.summary_at(operation, window_hours, Utc::now())
    }

    pub fn summary_at(
        &self,
        operation: &str,
        window_hours: u32,
        now: DateTime<Utc>,
    ) -> Option<MetricSummary> {
        let window_start = hours_before(now, u64::from(window_hours));
        let merged = self.merge_buckets(operation, hour_bucket(window_start), hour_bucket(now));
        let avg_ms = merged.avg_ms()?;

        let (mut durations, ema_ms, evicted_in_window) = match self.series.get(operation) {
            Some(series) => {
                let durations: Vec<f64> = series
                    .samples
                    .iter()
                    .filter(|s| s.timestamp >= window_start && s.timestamp <= now)
                    .map(|s| s.duration_ms)
                    .collect();
                let evicted = series.last_evicted.is_some_and(|t| t >= window_start);
                (durations, series.ema_ms, evicted)
            }
            None => (Vec::new(), None, false),
        };
        durations.sort_by(f64::total_cmp);

        let sampled =
            evicted_in_window || window_hours > self.config.raw_sample_retention_hours;

        Some(MetricSummary {
            operation: operation.to_string(),
            window_hours,
            count: merged.count,
            avg_ms,
            min_ms: merged.min_ms,
            max_ms: merged.max_ms,
            p50_ms: percentile(&durations, 0.50),
            p95_ms: percentile(&durations, 0.95),
            p99_ms: percentile(&durations, 0.99),
            ema_ms,
            sampled,
        })
    }

    /// Merge `operation`'s buckets in `first..=last`. Probes hour by hour
    /// unless the range is wider than the table, then scans it instead.
    fn merge_buckets(&self, operation: &str, first: i64, last: i64) -> MetricBucket {
        let mut merged = MetricBucket::default();
        let span = u64::try_from(last.saturating_sub(first)).unwrap_or(0);
        if span < self.buckets.len() as u64 {
            let mut key = (operation.to_string(), 0);
            for hour in first..=last {
                key.1 = hour;
                if let Some(bucket) = self.buckets.get(&key) {
                    merged.merge(&bucket);
                }
            }
        } else {
            for entry in self.buckets.iter() {
                let (name, hour) = entry.key();
                if name == operation && (first..=last).contains(hour) {
                    merged.merge(entry.value());
                }
            }
        }
        merged
    }

    /// Aggregate for a single hour bucket
    pub fn bucket(&self, operation: &str, hour: i64) -> Option<MetricBucket> {
        self.buckets
            .get(&(operation.to_string(), hour))
            .map(|bucket| *bucket)
    }

    /// Up to `limit` most recent raw samples, oldest first
    pub fn recent_samples(&self, operation: &str, limit: usize) -> Vec<MetricSample> {
        self.series
            .get(operation)
            .map(|series| {
                let skip = series.samples.len().saturating_sub(limit);
                series.samples.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Every operation with buckets or samples, sorted
    pub fn operations(&self) -> Vec<String> {
        let mut names: BTreeSet<String> =
            self.series.iter().map(|entry| entry.key().clone()).collect();
        names.extend(self.buckets.iter().map(|entry| entry.key().0.clone()));
        names.into_iter().collect()
    }

    pub fn system_snapshot(&self) -> SystemSnapshot {
        self.system.snapshot()
    }

    /// Drop buckets and raw samples past their retention
    pub fn purge_expired(&self) -> PurgeReport {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> PurgeReport {
        let bucket_cutoff = hour_bucket(hours_before(
            now,
            u64::from(self.config.aggregate_retention_days).saturating_mul(24),
        ));
        let sample_cutoff = hours_before(now, u64::from(self.config.raw_sample_retention_hours));

        let before = self.buckets.len();
        self.buckets.retain(|(_, hour), _| *hour >= bucket_cutoff);
        let buckets = before.saturating_sub(self.buckets.len());

        let mut samples = 0;
        for mut series in self.series.iter_mut() {
            let before = series.samples.len();
            series.samples.retain(|s| s.timestamp >= sample_cutoff);
            samples += before - series.samples.len();
        }
        let with_buckets: BTreeSet<String> =
            self.buckets.iter().map(|entry| entry.key().0.clone()).collect();
        self.series
            .retain(|name, series| !series.samples.is_empty() || with_buckets.contains(name));

        if buckets + samples > 0 {
            debug!(buckets, samples, "Purged expired metrics");
        }
        PurgeReport { buckets, samples }
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}
