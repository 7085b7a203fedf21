//! On-demand micro benchmarks
//!
//! These run against the live configuration so operators can compare
//! environments. They use their own counters and never touch the
//! production cache statistics or metrics.

use crate::context::PerformanceContext;
use mercado_cache::{CacheService, Codec, CompressionConfig};
use mercado_core::{Error, Result};
use mercado_metrics::{percentile, AggregatorConfig, MetricsAggregator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkKind {
    /// Set then get through the configured store
    Cache,
    /// Encode and decode a catalog-sized payload
    Codec,
    /// Record samples and compute a summary
    Metrics,
}

impl BenchmarkKind {
    pub const ALL: [BenchmarkKind; 3] = [Self::Cache, Self::Codec, Self::Metrics];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Codec => "codec",
            Self::Metrics => "metrics",
        }
    }
}

impl fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BenchmarkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::validation("type", format!("unknown benchmark '{s}', expected cache, codec or metrics"))
            })
    }
}

/// Timing results of one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub kind: BenchmarkKind,
    pub iterations: u32,
    pub total_ms: f64,
    pub ops_per_sec: f64,
    pub mean_us: f64,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    /// Kind-specific observations such as bytes saved by compression
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, f64>,
}

impl PerformanceContext {
    pub async fn run_benchmark(&self, kind: BenchmarkKind, iterations: u32) -> Result<BenchmarkReport> {
        if iterations == 0 {
            return Err(Error::validation("iterations", "must be greater than zero"));
        }

        let started = Instant::now();
        let (timings, details) = match kind {
            BenchmarkKind::Cache => self.bench_cache(iterations).await,
            BenchmarkKind::Codec => self.bench_codec(iterations)?,
            BenchmarkKind::Metrics => bench_metrics(iterations),
        };
        let report = build_report(kind, iterations, started.elapsed().as_secs_f64(), timings, details);

        tracing::info!(
            kind = %kind,
            iterations,
            ops_per_sec = report.ops_per_sec,
            p95_us = report.p95_us,
            "Benchmark finished"
        );
        Ok(report)
    }

    async fn bench_cache(&self, iterations: u32) -> (Vec<f64>, BTreeMap<String, f64>) {
        let cache = CacheService::new(Arc::clone(self.cache().store()), &self.config().cache);
        let value = sample_listing(8);
        let mut timings = Vec::with_capacity(iterations as usize);
        let mut misses = 0u32;

        for i in 0..iterations {
            let key = format!("bench:{i}");
            let started = Instant::now();
            cache.set(&key, &value, None).await;
            if cache.get::<serde_json::Value>(&key).await.is_none() {
                misses += 1;
            }
            timings.push(started.elapsed().as_secs_f64() * 1_000_000.0);
        }
        cache.delete_pattern("bench:*").await;

        let stats = cache.stats();
        let details = BTreeMap::from([
            ("misses".to_string(), f64::from(misses)),
            ("errors".to_string(), stats.errors as f64),
            ("bytes_saved".to_string(), stats.bytes_saved as f64),
        ]);
        (timings, details)
    }

    fn bench_codec(&self, iterations: u32) -> Result<(Vec<f64>, BTreeMap<String, f64>)> {
        let codec = Codec::new(CompressionConfig::from(&self.config().cache));
        let value = sample_listing(40);
        let mut timings = Vec::with_capacity(iterations as usize);
        let mut last_size = 0usize;
        let mut raw_size = 0usize;

        for _ in 0..iterations {
            let started = Instant::now();
            let encoded = codec
                .encode("bench:codec", &value)
                .map_err(Error::from)?;
            let _: serde_json::Value = codec
                .decode("bench:codec", &encoded.bytes)
                .map_err(Error::from)?;
            timings.push(started.elapsed().as_secs_f64() * 1_000_000.0);
            last_size = encoded.bytes.len();
            raw_size = last_size + encoded.bytes_saved as usize;
        }

        let details = BTreeMap::from([
            ("payload_bytes".to_string(), raw_size as f64),
            ("stored_bytes".to_string(), last_size as f64),
        ]);
        Ok((timings, details))
    }
}

fn bench_metrics(iterations: u32) -> (Vec<f64>, BTreeMap<String, f64>) {
    let aggregator = MetricsAggregator::with_collector(
        AggregatorConfig::default(),
        Arc::new(mercado_metrics::FixedSystemCollector::new(0.0, 0.0)),
    );
    let mut timings = Vec::with_capacity(iterations as usize);

    for i in 0..iterations {
        let started = Instant::now();
        aggregator.record_sample("bench", f64::from(i % 1000), BTreeMap::new());
        timings.push(started.elapsed().as_secs_f64() * 1_000_000.0);
    }

    let started = Instant::now();
    let summary_count = aggregator.summary("bench", 1).map_or(0, |s| s.count);
    let details = BTreeMap::from([
        (
            "summary_us".to_string(),
            started.elapsed().as_secs_f64() * 1_000_000.0,
        ),
        ("samples".to_string(), summary_count as f64),
    ]);
    (timings, details)
}

fn build_report(
    kind: BenchmarkKind,
    iterations: u32,
    total_secs: f64,
    mut timings: Vec<f64>,
    details: BTreeMap<String, f64>,
) -> BenchmarkReport {
    timings.sort_by(f64::total_cmp);
    let mean_us = if timings.is_empty() {
        0.0
    } else {
        timings.iter().sum::<f64>() / timings.len() as f64
    };
    let ops_per_sec = if total_secs > 0.0 {
        f64::from(iterations) / total_secs
    } else {
        0.0
    };

    BenchmarkReport {
        kind,
        iterations,
        total_ms: total_secs * 1000.0,
        ops_per_sec,
        mean_us,
        p50_us: percentile(&timings, 0.50).unwrap_or(0.0),
        p95_us: percentile(&timings, 0.95).unwrap_or(0.0),
        p99_us: percentile(&timings, 0.99).unwrap_or(0.0),
        details,
    }
}

fn sample_listing(description_repeats: usize) -> serde_json::Value {
    serde_json::json!({
        "id": 1042,
        "name": "Mochila arhuaca",
        "vendor": "tejidos-sierra",
        "price_cop": 320000,
        "description": "lana virgen tejida a mano en la sierra nevada ".repeat(description_repeats),
        "tags": ["artesania", "magdalena", "mochila"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("cache".parse::<BenchmarkKind>().unwrap(), BenchmarkKind::Cache);
        assert_eq!("CODEC".parse::<BenchmarkKind>().unwrap(), BenchmarkKind::Codec);
        assert!("disk".parse::<BenchmarkKind>().is_err());
    }

    #[test]
    fn test_metrics_bench_report() {
        let (timings, details) = bench_metrics(200);
        let report = build_report(BenchmarkKind::Metrics, 200, 0.01, timings, details);
        assert_eq!(report.iterations, 200);
        assert_eq!(report.details["samples"], 200.0);
        assert!(report.p50_us <= report.p95_us && report.p95_us <= report.p99_us);
        assert!((report.ops_per_sec - 20_000.0).abs() < 1e-6);
    }
}
