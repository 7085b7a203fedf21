//! Error handling, audit routing, maintenance and reports

use mercado_core::audit::MemoryAuditSink;
use mercado_core::{
    Error, ErrorCategory, ErrorContext, ErrorSeverity, PerformanceConfig, CACHE_HIT_RATE_METRIC,
    CPU_USAGE_METRIC,
};
use mercado_metrics::{AlertSeverity, FixedSystemCollector};
use mercado_perf::{from_config_file, tags, BenchmarkKind, PerformanceContext, Tags};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

async fn context_with(
    config: PerformanceConfig,
    sink: &Arc<MemoryAuditSink>,
    cpu: f64,
) -> PerformanceContext {
    PerformanceContext::builder(config)
        .audit_sink(sink.clone())
        .system_collector(Arc::new(FixedSystemCollector::new(cpu, 20.0)))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn security_errors_reach_the_audit_trail() {
    let sink = Arc::new(MemoryAuditSink::new());
    let perf = context_with(PerformanceConfig::default(), &sink, 10.0).await;

    let ctx = ErrorContext::new().with_user("u-77").with_ip("10.0.0.8");
    let info = perf.handle_error(&Error::security("token replay detected"), ctx);
    assert_eq!(info.category, ErrorCategory::Security);
    assert_eq!(info.severity, ErrorSeverity::Critical);
    // the caller-facing message never leaks the technical detail
    assert!(!info.to_response().message.contains("replay"));

    perf.handle_error(&Error::authentication("bad password"), ErrorContext::new());
    perf.handle_error(&Error::validation("email", "missing @"), ErrorContext::new());
    perf.close().await;

    let events = sink.events();
    let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, ["error.security", "error.authentication"]);
    assert_eq!(events[0].user_id.as_deref(), Some("u-77"));
    assert_eq!(events[0].ip_address.as_deref(), Some("10.0.0.8"));

    let stats = perf.error_stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_category[&ErrorCategory::Validation], 1);
    assert_eq!(stats.recent[0].category, ErrorCategory::Validation);
}

#[tokio::test]
async fn correlation_timeline_collects_operations_and_errors() {
    let sink = Arc::new(MemoryAuditSink::new());
    let perf = context_with(PerformanceConfig::default(), &sink, 10.0).await;

    let id = perf.begin_request(Some("u-5"), Some("/api/orders"), Some("192.168.1.4"));
    assert!(perf.record_event(&id, "request", "received"));

    perf.monitor_operation("create_order", Tags::new())
        .with_correlation(&id)
        .complete();

    let ctx = perf.error_context(&id);
    assert_eq!(ctx.user_id.as_deref(), Some("u-5"));
    assert_eq!(ctx.endpoint.as_deref(), Some("/api/orders"));
    let info = perf.handle_error(&Error::database("insert order", "deadlock"), ctx);
    assert_eq!(info.context.correlation_id.as_deref(), Some(id.as_str()));

    let timeline = perf.end_request(&id).unwrap();
    let kinds: Vec<_> = timeline.events.iter().map(|e| e.kind.as_str()).collect();
    assert_eq!(kinds, ["request", "operation", "error"]);
    assert!(perf.correlation(&id).is_none());
    assert!(!perf.record_event(&id, "late", "after end"));
}

#[tokio::test]
async fn maintenance_raises_hit_rate_and_cpu_alerts() {
    let sink = Arc::new(MemoryAuditSink::new());
    let mut config = PerformanceConfig::default();
    config.alerts.min_hit_rate_lookups = 10;
    let perf = context_with(config, &sink, 96.0).await;

    for i in 0..9 {
        assert!(perf.cache().get::<u32>(&format!("missing:{i}")).await.is_none());
    }
    let report = perf.run_maintenance().await;
    assert!(report
        .alerts_raised
        .iter()
        .all(|a| a.metric_name != CACHE_HIT_RATE_METRIC));

    perf.cache().get::<u32>("missing:9").await;
    let report = perf.run_maintenance().await;
    let hit_rate = report
        .alerts_raised
        .iter()
        .find(|a| a.metric_name == CACHE_HIT_RATE_METRIC)
        .unwrap();
    assert_eq!(hit_rate.severity, AlertSeverity::Critical);
    assert_eq!(hit_rate.current_value, 0.0);
    assert!(report
        .alerts_raised
        .iter()
        .any(|a| a.metric_name == CPU_USAGE_METRIC && a.severity == AlertSeverity::Critical));
    assert_eq!(report.correlations_swept, None);

    perf.close().await;
    assert!(sink.events().iter().all(|e| e.event_type == "alert.critical"));
    // cpu on both passes, hit rate on the second
    assert_eq!(sink.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn maintenance_loop_runs_until_closed() {
    let sink = Arc::new(MemoryAuditSink::new());
    let mut config = PerformanceConfig::default();
    config.maintenance_interval_secs = 30;
    let perf = context_with(config, &sink, 96.0).await;

    assert!(perf.start());
    assert!(!perf.start());

    tokio::time::sleep(Duration::from_secs(65)).await;
    let cpu_alerts = perf
        .active_alerts(1)
        .into_iter()
        .filter(|a| a.metric_name == CPU_USAGE_METRIC)
        .count();
    assert_eq!(cpu_alerts, 2);

    perf.close().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(perf.alerts().counts().critical, 2);
}

#[tokio::test]
async fn overview_and_prometheus_text() {
    let sink = Arc::new(MemoryAuditSink::new());
    let perf = context_with(PerformanceConfig::default(), &sink, 10.0).await;

    perf.cached("product:1", None, || async { "X".to_string() }).await;
    perf.cached("product:1", None, || async { "Y".to_string() }).await;
    perf.monitor_operation("list_vendors", tags([("kind", "db")]))
        .complete();
    let _ = perf
        .call_external::<(), _, _>("payments", ErrorContext::new(), || async {
            Err(Error::payment("wompi", "timeout"))
        })
        .await;

    let overview = perf.overview();
    assert_eq!(overview.window_hours, 1);
    assert_eq!(overview.cache.hits, 1);
    assert_eq!(overview.cache.misses, 1);
    assert_eq!(overview.errors.total, 1);
    assert_eq!(overview.breakers.len(), 1);
    assert_eq!(overview.system.cpu_usage_pct, 10.0);
    assert!(overview
        .operations
        .iter()
        .any(|op| op.summary.operation == "list_vendors" && op.compliance.is_compliant()));

    let json = serde_json::to_value(&overview).unwrap();
    assert!(json["operations"].is_array());

    let status = perf.cache_status().await;
    assert!(status.healthy);
    assert_eq!(status.lookup_latency.unwrap().count, 2);

    let text = perf.metrics_text().unwrap();
    assert!(text.contains("mercado_operations_total"));
    assert!(text.contains("mercado_cache_lookups_total"));
    assert!(text.contains("mercado_errors_total"));
    assert!(perf.breakers()[0].name == "payments");
}

#[tokio::test]
async fn reports_accept_any_window() {
    let sink = Arc::new(MemoryAuditSink::new());
    let perf = context_with(PerformanceConfig::default(), &sink, 99.0).await;

    perf.monitor_operation("list_vendors", Tags::new()).complete();
    perf.run_maintenance().await;

    assert!(!perf.active_alerts(u32::MAX).is_empty());
    let stats = perf.performance_stats(u32::MAX);
    assert_eq!(stats.window_hours, u32::MAX);
    assert!(stats
        .operations
        .iter()
        .any(|op| op.summary.operation == "list_vendors" && op.summary.count == 1));
}

#[tokio::test]
async fn benchmarks_leave_production_counters_alone() {
    let sink = Arc::new(MemoryAuditSink::new());
    let perf = context_with(PerformanceConfig::default(), &sink, 10.0).await;

    for kind in BenchmarkKind::ALL {
        let report = perf.run_benchmark(kind, 50).await.unwrap();
        assert_eq!(report.kind, kind);
        assert_eq!(report.iterations, 50);
        assert!(report.p50_us <= report.p99_us);
    }
    assert!(perf.run_benchmark(BenchmarkKind::Cache, 0).await.is_err());

    let stats = perf.cache().stats();
    assert_eq!(stats.total_lookups, 0);
    assert_eq!(stats.sets, 0);
    assert!(perf.cache().store().keys_matching("bench:*").await.unwrap().is_empty());
}

#[tokio::test]
async fn jsonl_audit_file_from_config() {
    let dir = TempDir::new().unwrap();
    let audit_path = dir.path().join("audit.jsonl");
    let config_path = dir.path().join("perf.json");

    let mut config = PerformanceConfig::default();
    config.audit.jsonl_path = Some(audit_path.clone());
    config.sla.api_response_time_critical_ms = 1500.0;
    std::fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

    let perf = from_config_file(Some(config_path.as_path())).await.unwrap();
    assert_eq!(perf.config().sla.api_response_time_critical_ms, 1500.0);

    perf.handle_error(&Error::authorization("open admin panel", "seller role"), ErrorContext::new());
    perf.close().await;

    let contents = std::fs::read_to_string(&audit_path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let event: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(event["event_type"], "error.authorization");
}

#[tokio::test]
async fn missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = from_config_file(Some(dir.path().join("absent.json").as_path()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("loading performance configuration"));
}
