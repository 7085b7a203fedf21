use mercado_core::PerformanceConfig;

pub fn execute(config: &PerformanceConfig) -> eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
