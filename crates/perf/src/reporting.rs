//! Data behind the reporting endpoints
//!
//! Every report is `serde`-serializable so an HTTP layer can return it
//! as-is.

use crate::context::{PerformanceContext, SlowQuery};
use crate::errors::ErrorStats;
use chrono::{DateTime, Utc};
use mercado_cache::CacheStatsSnapshot;
use mercado_core::audit::AuditStats;
use mercado_core::{Error, Result, CACHE_LOOKUP_OPERATION};
use mercado_metrics::{
    Alert, AlertCounts, MetricSummary, OperationKind, SlaCompliance, SystemSnapshot,
};
use mercado_utils::BreakerSnapshot;
use serde::{Deserialize, Serialize};

/// Default lookback for summaries in the overview
pub const OVERVIEW_WINDOW_HOURS: u32 = 1;

/// Summary and SLA verdict for one operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub summary: MetricSummary,
    pub compliance: SlaCompliance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub window_hours: u32,
    pub operations: Vec<OperationReport>,
    /// Newest first
    pub slow_queries: Vec<SlowQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub healthy: bool,
    pub store_type: String,
    pub stats: CacheStatsSnapshot,
    /// Lookup latency over the last hour
    pub lookup_latency: Option<MetricSummary>,
}

/// Everything a dashboard shows on its landing page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceOverview {
    pub generated_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub window_hours: u32,
    pub operations: Vec<OperationReport>,
    pub cache: CacheStatsSnapshot,
    pub alerts: AlertCounts,
    pub system: SystemSnapshot,
    pub breakers: Vec<BreakerSnapshot>,
    pub errors: ErrorStats,
    pub audit: AuditStats,
    pub active_correlations: usize,
}

impl PerformanceContext {
    pub fn overview(&self) -> PerformanceOverview {
        let inner = &self.inner;
        let mut errors = inner.errors.stats();
        errors.recent.truncate(10);

        PerformanceOverview {
            generated_at: Utc::now(),
            uptime_secs: self.uptime().as_secs(),
            window_hours: OVERVIEW_WINDOW_HOURS,
            operations: self.operation_reports(OVERVIEW_WINDOW_HOURS),
            cache: inner.cache.stats(),
            alerts: inner.alerts.counts(),
            system: inner.metrics.system_snapshot(),
            breakers: inner.breakers.snapshot(),
            errors,
            audit: inner.audit.stats(),
            active_correlations: inner.correlations.len(),
        }
    }

    /// Alerts raised in the last `hours` hours, newest first
    pub fn active_alerts(&self, hours: u32) -> Vec<Alert> {
        self.inner.alerts.active_alerts(hours)
    }

    pub async fn cache_status(&self) -> CacheStatus {
        let cache = &self.inner.cache;
        CacheStatus {
            healthy: cache.health().await,
            store_type: cache.store().store_type().to_string(),
            stats: cache.stats(),
            lookup_latency: self.inner.metrics.summary(CACHE_LOOKUP_OPERATION, 1),
        }
    }

    pub fn performance_stats(&self, window_hours: u32) -> PerformanceStats {
        PerformanceStats {
            window_hours,
            operations: self.operation_reports(window_hours),
            slow_queries: self.inner.slow_queries.lock().iter().rev().cloned().collect(),
        }
    }

    pub fn breakers(&self) -> Vec<BreakerSnapshot> {
        self.inner.breakers.snapshot()
    }

    /// Prometheus text exposition with current gauges
    pub fn metrics_text(&self) -> Result<String> {
        let inner = &self.inner;
        let cache = inner.cache.stats();
        let audit = inner.audit.stats();

        inner.exporter.set_gauge("cache_hit_rate_pct", cache.hit_rate_pct);
        inner.exporter.set_gauge("cache_bytes_saved", cache.bytes_saved as f64);
        inner.exporter.set_gauge("cache_errors", cache.errors as f64);
        inner.exporter.set_gauge("audit_dropped", audit.audit_dropped as f64);
        inner
            .exporter
            .set_gauge("active_correlations", inner.correlations.len() as f64);
        inner.exporter.set_gauge("uptime_seconds", self.uptime().as_secs_f64());

        inner
            .exporter
            .render()
            .map_err(|e| Error::other(format!("failed to render metrics: {e}")))
    }

    fn operation_reports(&self, window_hours: u32) -> Vec<OperationReport> {
        let inner = &self.inner;
        inner
            .metrics
            .operations()
            .into_iter()
            .filter_map(|operation| inner.metrics.summary(&operation, window_hours))
            .map(|summary| {
                let kind = inner
                    .metrics
                    .recent_samples(&summary.operation, 1)
                    .first()
                    .map_or(OperationKind::Api, |s| OperationKind::from_tags(&s.tags));
                let compliance = SlaCompliance::evaluate(&summary, kind, &inner.config.sla);
                OperationReport {
                    summary,
                    compliance,
                }
            })
            .collect()
    }
}
