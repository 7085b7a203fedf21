use mercado_core::PerformanceConfig;
use mercado_perf::{BenchmarkKind, PerformanceContext};

pub async fn execute(
    config: PerformanceConfig,
    kind: Option<BenchmarkKind>,
    iterations: u32,
) -> eyre::Result<()> {
    let perf = PerformanceContext::new(config).await?;
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => BenchmarkKind::ALL.to_vec(),
    };

    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        tracing::info!(kind = %kind, iterations, "Running benchmark");
        reports.push(perf.run_benchmark(kind, iterations).await?);
    }
    perf.close().await;

    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
