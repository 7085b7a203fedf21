//! Cache-aside, monitoring and circuit breaking through the context

use mercado_cache::UnavailableStore;
use mercado_core::audit::MemoryAuditSink;
use mercado_core::{Error, ErrorCategory, ErrorContext, PerformanceConfig};
use mercado_metrics::{AlertSeverity, FixedSystemCollector};
use mercado_perf::{tags, PerformanceContext, Tags};
use mercado_utils::CircuitState;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn context() -> PerformanceContext {
    PerformanceContext::builder(PerformanceConfig::default())
        .audit_sink(Arc::new(MemoryAuditSink::new()))
        .system_collector(Arc::new(FixedSystemCollector::new(10.0, 20.0)))
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn cache_aside_hit_skips_compute() {
    let perf = context().await;
    assert!(
        perf.cache()
            .set("product:1", &json!({"name": "X"}), Some(Duration::from_secs(600)))
            .await
    );

    let calls = AtomicUsize::new(0);
    let value: Value = perf
        .get_cached_or_compute("product:1", Some(Duration::from_secs(600)), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"name": "computed"}))
        })
        .await
        .unwrap();

    assert_eq!(value, json!({"name": "X"}));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(perf.cache().stats().hits, 1);

    let lookup = perf.metrics().recent_samples("cache.lookup", 1);
    assert_eq!(lookup[0].tags["result"], "hit");
}

#[tokio::test]
async fn cache_aside_miss_computes_and_stores() {
    let perf = context().await;

    let first: u32 = perf
        .get_cached_or_compute("catalog:home", None, || async { Ok(42) })
        .await
        .unwrap();
    let second: u32 = perf
        .get_cached_or_compute("catalog:home", None, || async {
            Err(Error::database("load catalog", "should not be called"))
        })
        .await
        .unwrap();

    assert_eq!((first, second), (42, 42));
    let stats = perf.cache().stats();
    assert_eq!((stats.misses, stats.hits, stats.sets), (1, 1, 1));
    assert_eq!(perf.metrics().summary("compute:catalog", 1).unwrap().count, 1);
}

#[tokio::test]
async fn unreachable_store_falls_through_to_compute() {
    let perf = PerformanceContext::builder(PerformanceConfig::default())
        .store(Arc::new(UnavailableStore::default()))
        .audit_sink(Arc::new(MemoryAuditSink::new()))
        .system_collector(Arc::new(FixedSystemCollector::new(10.0, 20.0)))
        .build()
        .await
        .unwrap();

    for _ in 0..3 {
        let value: String = perf
            .get_cached_or_compute("vendor:7", None, || async { Ok("Artesanias Sinu".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "Artesanias Sinu");
    }

    let stats = perf.cache().stats();
    assert_eq!(stats.hits, 0);
    // one failed read and one failed write per call
    assert_eq!(stats.errors, 6);
}

#[tokio::test]
async fn compute_errors_propagate_and_store_nothing() {
    let perf = context().await;

    let err = perf
        .get_cached_or_compute::<String, _, _>("order:9", None, || async {
            Err(Error::payment("wompi", "card declined"))
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Payment { .. }));
    assert!(!perf.cache().exists("order:9").await);
    let sample = &perf.metrics().recent_samples("compute:order", 1)[0];
    assert_eq!(sample.tags["status"], "error");
    assert_eq!(sample.tags["error"], "payment");
}

#[tokio::test]
async fn cached_variant_and_invalidation() {
    let perf = context().await;
    for id in 1..=3 {
        let key = format!("product:{id}");
        let name: String = perf.cached(&key, None, || async move { format!("item {id}") }).await;
        assert_eq!(name, format!("item {id}"));
    }
    perf.cached("vendor:1", None, || async { 1u8 }).await;

    assert_eq!(perf.invalidate_pattern("product:*").await, 3);
    assert!(perf.cache().exists("vendor:1").await);
}

#[tokio::test(start_paused = true)]
async fn sla_breach_raises_exactly_one_critical_alert() {
    let perf = context().await;

    for _ in 0..10 {
        let scope = perf.monitor_operation("GET /api/products", Tags::new());
        tokio::time::advance(Duration::from_millis(800)).await;
        scope.complete();
    }
    let critical = |perf: &PerformanceContext| {
        perf.active_alerts(1)
            .into_iter()
            .filter(|a| a.severity == AlertSeverity::Critical)
            .count()
    };
    assert_eq!(critical(&perf), 0);

    let scope = perf.monitor_operation("GET /api/products", Tags::new());
    tokio::time::advance(Duration::from_millis(1200)).await;
    let elapsed = scope.complete();
    assert_eq!(elapsed, Duration::from_millis(1200));

    assert_eq!(critical(&perf), 1);
    let summary = perf.metrics().summary("GET /api/products", 1).unwrap();
    assert_eq!(summary.count, 11);
    assert_eq!(summary.max_ms, 1200.0);
}

#[tokio::test(start_paused = true)]
async fn db_operations_use_query_thresholds_and_slow_log() {
    let perf = context().await;
    let correlation_id = perf.begin_request(Some("u-1"), Some("/checkout"), None);

    let scope = perf
        .monitor_operation("select_order_lines", tags([("kind", "db")]))
        .with_correlation(&correlation_id);
    tokio::time::advance(Duration::from_millis(1500)).await;
    scope.complete();

    let alerts = perf.active_alerts(1);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].threshold, 500.0);

    let stats = perf.performance_stats(1);
    assert_eq!(stats.slow_queries.len(), 1);
    assert_eq!(stats.slow_queries[0].correlation_id.as_deref(), Some(correlation_id.as_str()));
    assert_eq!(stats.operations[0].compliance.violations, 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_future_still_records_a_sample() {
    let perf = context().await;

    let slow = perf.monitor("search:reindex", Tags::new(), async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    });
    let timed_out = tokio::time::timeout(Duration::from_secs(2), slow).await;
    assert!(timed_out.is_err());

    let samples = perf.metrics().recent_samples("search:reindex", 1);
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].tags["status"], "cancelled");
    assert_eq!(samples[0].duration_ms, 2000.0);
}

#[tokio::test]
async fn dropped_scope_records_cancelled() {
    let perf = context().await;
    {
        let _scope = perf.monitor_operation("early_return", Tags::new());
    }
    let samples = perf.metrics().recent_samples("early_return", 1);
    assert_eq!(samples[0].tags["status"], "cancelled");
}

#[tokio::test]
async fn nested_scopes_record_independently() {
    let perf = context().await;
    let outer = perf.monitor_operation("checkout", Tags::new());
    let inner = perf.monitor_operation("checkout.reserve_stock", tags([("kind", "db")]));
    inner.complete();
    outer.complete();

    let ops = perf.metrics().operations();
    assert!(ops.contains(&"checkout".to_string()));
    assert!(ops.contains(&"checkout.reserve_stock".to_string()));
}

#[tokio::test(start_paused = true)]
async fn open_breaker_rejects_fast_then_allows_trial() {
    let perf = context().await;
    let attempts = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        let attempts = Arc::clone(&attempts);
        let err = perf
            .call_external::<(), _, _>("shipping-api", ErrorContext::new(), || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(Error::external_service("shipping-api", "502 bad gateway"))
            })
            .await
            .unwrap_err();
        assert_eq!(err.category, ErrorCategory::ExternalService);
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    let breaker = perf.circuit_breakers().get("shipping-api").unwrap();
    assert_eq!(breaker.state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(10)).await;
    let rejected = {
        let attempts = Arc::clone(&attempts);
        perf.call_external("shipping-api", ErrorContext::new(), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Ok("quote")
        })
        .await
        .unwrap_err()
    };
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
    assert!(rejected.recoverable);
    assert_eq!(rejected.retry_after, Some(Duration::from_secs(50)));
    assert_eq!(rejected.to_response().retry_after_seconds, Some(50));

    tokio::time::advance(Duration::from_secs(51)).await;
    let quote = {
        let attempts = Arc::clone(&attempts);
        perf.call_external("shipping-api", ErrorContext::new(), || async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Ok("quote")
        })
        .await
        .unwrap()
    };
    assert_eq!(quote, "quote");
    assert_eq!(attempts.load(Ordering::SeqCst), 6);
    assert_eq!(breaker.state(), CircuitState::HalfOpen);
}
