//! Aggregator behaviour under concurrent writers

use chrono::{TimeZone, Utc};
use mercado_metrics::{
    hour_bucket, AggregatorConfig, FixedSystemCollector, MetricsAggregator, SlaCompliance,
    OperationKind,
};
use mercado_core::SlaThresholds;
use std::collections::BTreeMap;
use std::sync::Arc;

fn aggregator() -> Arc<MetricsAggregator> {
    Arc::new(MetricsAggregator::with_collector(
        AggregatorConfig::default(),
        Arc::new(FixedSystemCollector::new(5.0, 5.0)),
    ))
}

#[test]
fn concurrent_samples_are_all_counted() {
    let agg = aggregator();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 20, 0).unwrap();

    std::thread::scope(|scope| {
        for t in 0..8u32 {
            let agg = Arc::clone(&agg);
            scope.spawn(move || {
                for i in 0..500u32 {
                    agg.record_sample_at("checkout", f64::from(t * 500 + i), BTreeMap::new(), at);
                }
            });
        }
    });

    let bucket = agg.bucket("checkout", hour_bucket(at)).unwrap();
    assert_eq!(bucket.count, 4000);
    assert_eq!(bucket.min_ms, 0.0);
    assert_eq!(bucket.max_ms, 3999.0);
    assert!((bucket.avg_ms().unwrap() - 1999.5).abs() < 1e-6);
}

#[test]
fn summary_feeds_compliance() {
    let agg = aggregator();
    let at = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
    for _ in 0..99 {
        agg.record_sample_at("GET /cart", 100.0, BTreeMap::new(), at);
    }
    agg.record_sample_at("GET /cart", 2500.0, BTreeMap::new(), at);

    let summary = agg.summary_at("GET /cart", 1, at).unwrap();
    let compliance = SlaCompliance::evaluate(&summary, OperationKind::Api, &SlaThresholds::default());

    // one slow outlier lands at p100, the p99 rank is still fast
    assert_eq!(summary.p99_ms, Some(100.0));
    assert!(compliance.is_compliant());

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["count"], 100);
}
