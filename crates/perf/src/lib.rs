//! Integrated performance layer
//!
//! [`PerformanceContext`] is the one handle business code talks to. It
//! combines the cache, metrics, alerting, circuit breakers, error
//! classification, correlation and audit into a handful of calls:
//!
//! - [`monitor_operation`](PerformanceContext::monitor_operation) and
//!   [`monitor`](PerformanceContext::monitor) time work and check SLAs
//! - [`get_cached_or_compute`](PerformanceContext::get_cached_or_compute)
//!   does cache-aside that survives cache outages
//! - [`call_external`](PerformanceContext::call_external) guards volatile
//!   dependencies with a circuit breaker
//! - [`handle_error`](PerformanceContext::handle_error) turns any error into
//!   a safe, classified [`ErrorInfo`](mercado_core::ErrorInfo)
//!
//! ```no_run
//! use mercado_core::PerformanceConfig;
//! use mercado_perf::PerformanceContext;
//!
//! # async fn demo() -> mercado_core::Result<()> {
//! let perf = PerformanceContext::new(PerformanceConfig::default()).await?;
//! perf.start();
//!
//! let name: String = perf
//!     .get_cached_or_compute("product:1", None, || async { Ok("Hamaca".to_string()) })
//!     .await?;
//!
//! perf.close().await;
//! # Ok(())
//! # }
//! ```

mod benchmark;
mod caching;
mod context;
mod errors;
mod maintenance;
mod reporting;
mod scope;

pub use benchmark::{BenchmarkKind, BenchmarkReport};
pub use context::{from_config_file, PerformanceContext, PerformanceContextBuilder, SlowQuery};
pub use errors::ErrorStats;
pub use maintenance::MaintenanceReport;
pub use reporting::{
    CacheStatus, OperationReport, PerformanceOverview, PerformanceStats, OVERVIEW_WINDOW_HOURS,
};
pub use scope::{tags, OperationScope, OperationStatus, Tags};
