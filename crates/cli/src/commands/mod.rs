use clap::{Parser, Subcommand};
use eyre::WrapErr;
use mercado_core::config::ConfigLoader;
use mercado_core::PerformanceConfig;
use mercado_perf::BenchmarkKind;
use std::path::{Path, PathBuf};

pub mod bench;
pub mod config;
pub mod report;

#[derive(Parser)]
#[command(name = "mercado-perf")]
#[command(about = "Benchmarks and reports for the mercado performance layer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON configuration file (defaults to $MERCADO_CONFIG, then built-in defaults)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run micro benchmarks against the configured layer
    Bench {
        /// Benchmark to run (cache, codec or metrics); all when omitted
        #[arg(long)]
        kind: Option<BenchmarkKind>,

        /// Iterations per benchmark
        #[arg(long, default_value = "1000")]
        iterations: u32,
    },

    /// Drive a short synthetic load and print the performance overview
    Report {
        /// Number of synthetic requests
        #[arg(long, default_value = "200")]
        requests: u32,

        /// Print Prometheus text instead of the JSON overview
        #[arg(long)]
        prometheus: bool,
    },

    /// Print the effective configuration
    Config,
}

impl Commands {
    pub async fn execute(self, config_path: Option<&Path>) -> eyre::Result<()> {
        let config = load_config(config_path)?;
        match self {
            Commands::Bench { kind, iterations } => bench::execute(config, kind, iterations).await,
            Commands::Report {
                requests,
                prometheus,
            } => report::execute(config, requests, prometheus).await,
            Commands::Config => config::execute(&config),
        }
    }
}

pub fn load_config(path: Option<&Path>) -> eyre::Result<PerformanceConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.file(path);
    }
    loader
        .load()
        .wrap_err("failed to load performance configuration")
}
