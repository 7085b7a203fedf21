//! Periodic housekeeping

use crate::context::{ContextInner, PerformanceContext};
use mercado_core::{CACHE_HIT_RATE_METRIC, CPU_USAGE_METRIC, MEMORY_USAGE_METRIC};
use mercado_metrics::{Alert, PurgeReport};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// What one maintenance pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub metrics_purged: PurgeReport,
    pub alerts_purged: usize,
    pub cache_entries_purged: usize,
    /// `None` when the correlation sweep was not due
    pub correlations_swept: Option<usize>,
    pub alerts_raised: Vec<Alert>,
}

impl PerformanceContext {
    /// Spawn the maintenance loop on the current Tokio runtime.
    ///
    /// Returns `false` if it is already running. The loop ends on
    /// [`close`](Self::close) or once every context handle is dropped.
    pub fn start(&self) -> bool {
        let mut slot = self.inner.maintenance.lock();
        if slot.is_some() {
            return false;
        }

        let period = Duration::from_secs(self.inner.config.maintenance_interval_secs.max(1));
        let weak = Arc::downgrade(&self.inner);
        let mut shutdown = self.inner.shutdown.subscribe();

        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !run_pass(&weak).await {
                            break;
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Maintenance loop stopped");
        }));
        info!(interval_secs = period.as_secs(), "Maintenance started");
        true
    }

    /// Run one maintenance pass now
    pub async fn run_maintenance(&self) -> MaintenanceReport {
        maintain(&self.inner).await
    }
}

async fn run_pass(weak: &Weak<ContextInner>) -> bool {
    match weak.upgrade() {
        Some(inner) => {
            maintain(&inner).await;
            true
        }
        None => false,
    }
}

async fn maintain(inner: &ContextInner) -> MaintenanceReport {
    let mut report = MaintenanceReport {
        metrics_purged: inner.metrics.purge_expired(),
        alerts_purged: inner.alerts.purge_expired(),
        cache_entries_purged: inner.cache.purge_expired().await,
        ..MaintenanceReport::default()
    };

    let sweep_due = {
        let mut last_sweep = inner.last_sweep.lock();
        let interval = Duration::from_secs(inner.config.correlation.sweep_interval_secs);
        if last_sweep.elapsed() >= interval {
            *last_sweep = Instant::now();
            true
        } else {
            false
        }
    };
    if sweep_due {
        report.correlations_swept = Some(inner.correlations.sweep());
    }

    let cache = inner.cache.stats();
    if cache.total_lookups >= inner.config.alerts.min_hit_rate_lookups {
        report
            .alerts_raised
            .extend(inner.alerts.check_hit_rate(CACHE_HIT_RATE_METRIC, cache.hit_rate_pct));
    }

    let system = inner.metrics.system_snapshot();
    report
        .alerts_raised
        .extend(inner.alerts.check_cpu(CPU_USAGE_METRIC, system.cpu_usage_pct));
    report
        .alerts_raised
        .extend(inner.alerts.check_memory(MEMORY_USAGE_METRIC, system.memory_usage_pct));

    for alert in &report.alerts_raised {
        inner.on_alert(alert);
    }
    inner.exporter.set_gauge("cpu_usage_pct", system.cpu_usage_pct);
    inner.exporter.set_gauge("memory_usage_pct", system.memory_usage_pct);

    debug!(
        metrics_buckets = report.metrics_purged.buckets,
        metrics_samples = report.metrics_purged.samples,
        alerts_purged = report.alerts_purged,
        cache_purged = report.cache_entries_purged,
        alerts_raised = report.alerts_raised.len(),
        "Maintenance pass finished"
    );
    report
}
