//! Prometheus text exposition

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Latency buckets in seconds, tuned for request and query times
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Prometheus collectors for the performance layer
pub struct PrometheusExporter {
    registry: Registry,
    operation_duration: HistogramVec,
    operations: IntCounterVec,
    alerts: IntCounterVec,
    errors: IntCounterVec,
    cache_events: CounterVec,
    gauges: GaugeVec,
}

impl PrometheusExporter {
    /// Create collectors in a private registry
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "mercado_operation_duration_seconds",
                "Monitored operation duration in seconds",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["operation", "status"],
        )?;
        registry.register(Box::new(operation_duration.clone()))?;

        let operations = IntCounterVec::new(
            Opts::new(
                "mercado_operations_total",
                "Total number of monitored operations",
            ),
            &["operation", "status"],
        )?;
        registry.register(Box::new(operations.clone()))?;

        let alerts = IntCounterVec::new(
            Opts::new("mercado_alerts_total", "Total number of SLA alerts raised"),
            &["severity"],
        )?;
        registry.register(Box::new(alerts.clone()))?;

        let errors = IntCounterVec::new(
            Opts::new("mercado_errors_total", "Total number of handled errors"),
            &["category", "severity"],
        )?;
        registry.register(Box::new(errors.clone()))?;

        let cache_events = CounterVec::new(
            Opts::new(
                "mercado_cache_lookups_total",
                "Cache-aside lookups by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(cache_events.clone()))?;

        let gauges = GaugeVec::new(
            Opts::new("mercado_stats", "Point-in-time performance statistics"),
            &["metric"],
        )?;
        registry.register(Box::new(gauges.clone()))?;

        Ok(Self {
            registry,
            operation_duration,
            operations,
            alerts,
            errors,
            cache_events,
            gauges,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_operation(&self, operation: &str, status: &str, duration: Duration) {
        self.operation_duration
            .with_label_values(&[operation, status])
            .observe(duration.as_secs_f64());
        self.operations.with_label_values(&[operation, status]).inc();
    }

    pub fn record_alert(&self, severity: &str) {
        self.alerts.with_label_values(&[severity]).inc();
    }

    pub fn record_error(&self, category: &str, severity: &str) {
        self.errors.with_label_values(&[category, severity]).inc();
    }

    pub fn record_cache_lookup(&self, result: &str) {
        self.cache_events.with_label_values(&[result]).inc();
    }

    pub fn set_gauge(&self, metric: &str, value: f64) {
        self.gauges.with_label_values(&[metric]).set(value);
    }

    /// Render every collector in the text exposition format
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_contains_recorded_series() {
        let exporter = PrometheusExporter::new().unwrap();
        exporter.record_operation("GET /products", "ok", Duration::from_millis(42));
        exporter.record_alert("critical");
        exporter.record_error("database", "high");
        exporter.record_cache_lookup("hit");
        exporter.set_gauge("cache_hit_rate_pct", 87.5);

        let text = exporter.render().unwrap();
        assert!(text.contains("mercado_operation_duration_seconds_bucket"));
        assert!(text.contains(r#"mercado_operations_total{operation="GET /products",status="ok"} 1"#));
        assert!(text.contains(r#"mercado_alerts_total{severity="critical"} 1"#));
        assert!(text.contains(r#"mercado_errors_total{category="database",severity="high"} 1"#));
        assert!(text.contains(r#"mercado_stats{metric="cache_hit_rate_pct"} 87.5"#));
    }

    #[test]
    fn test_independent_registries() {
        let a = PrometheusExporter::new().unwrap();
        let b = PrometheusExporter::new().unwrap();
        a.record_alert("warning");
        assert!(!b.render().unwrap().contains("mercado_alerts_total{"));
    }
}
