//! Duration metrics, SLA compliance and threshold alerts
//!
//! [`MetricsAggregator`] buckets per-operation durations by wall-clock hour
//! and keeps a bounded set of raw samples for exact percentiles.
//! [`AlertEvaluator`] turns crossed SLA thresholds into [`Alert`]s and
//! [`PrometheusExporter`] renders everything for scraping.

pub mod aggregator;
pub mod alerts;
pub mod exporter;
pub mod sample;
pub mod sla;
pub mod summary;
pub mod system;

pub use aggregator::{AggregatorConfig, MetricsAggregator, PurgeReport};
pub use alerts::{Alert, AlertCounts, AlertEvaluator, AlertSeverity, Direction, Threshold};
pub use exporter::PrometheusExporter;
pub use sample::{hour_bucket, MetricBucket, MetricSample, BUCKET_SECS};
pub use sla::{compliance_score, OperationKind, SlaCompliance};
pub use summary::{percentile, MetricSummary};
pub use system::{FixedSystemCollector, SysinfoCollector, SystemCollector, SystemSnapshot};
