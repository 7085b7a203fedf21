use mercado_core::{Error, PerformanceConfig};
use mercado_perf::{tags, PerformanceContext, Tags};
use rand::Rng;
use std::time::Duration;

const CATALOG_SIZE: u32 = 25;

pub async fn execute(config: PerformanceConfig, requests: u32, prometheus: bool) -> eyre::Result<()> {
    let perf = PerformanceContext::new(config).await?;
    synthetic_load(&perf, requests).await?;
    perf.run_maintenance().await;

    if prometheus {
        print!("{}", perf.metrics_text()?);
    } else {
        let overview = perf.overview();
        println!("{}", serde_json::to_string_pretty(&overview)?);
    }
    perf.close().await;
    Ok(())
}

/// Catalog reads with a cache in front, occasional queries and a flaky
/// payment provider
async fn synthetic_load(perf: &PerformanceContext, requests: u32) -> eyre::Result<()> {
    let latencies: Vec<u64> = {
        let mut rng = rand::thread_rng();
        (0..requests).map(|_| rng.gen_range(1..8)).collect()
    };
    tracing::info!(requests, "Generating synthetic load");

    for (i, latency_ms) in (0..requests).zip(latencies) {
        let correlation_id = perf.begin_request(None, Some("/api/products"), None);
        let product = i % CATALOG_SIZE;

        perf.monitor(
            "GET /api/products",
            Tags::new(),
            async {
                tokio::time::sleep(Duration::from_millis(latency_ms)).await;
                let key = format!("product:{product}");
                perf.get_cached_or_compute(&key, None, || async move {
                    Ok(serde_json::json!({ "id": product, "name": format!("producto {product}") }))
                })
                .await
            },
        )
        .await?;

        if i % 10 == 0 {
            perf.monitor("select_listings", tags([("kind", "db")]), async {
                tokio::time::sleep(Duration::from_millis(latency_ms * 2)).await;
                Ok(())
            })
            .await?;
        }

        if i % 50 == 49 {
            let context = perf.error_context(&correlation_id);
            let outcome = perf
                .call_external::<(), _, _>("payments", context, || async {
                    Err(Error::payment("sandbox", "simulated decline"))
                })
                .await;
            if let Err(info) = outcome {
                tracing::debug!(error_id = %info.error_id, "Simulated payment failure");
            }
        }

        perf.end_request(&correlation_id);
    }
    Ok(())
}
