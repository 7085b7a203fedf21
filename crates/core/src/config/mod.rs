//! Performance-layer configuration
//!
//! Every section is defaulted, so an empty JSON object is a valid config.
//! [`ConfigLoader`] layers a JSON file and `MERCADO_*` environment variables
//! over the defaults.

mod loader;
mod sla;
mod ttl;

pub use loader::ConfigLoader;
pub use sla::SlaThresholds;
pub use ttl::{TtlClass, TtlPolicyConfig};

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the performance layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub cache: CacheConfig,
    pub metrics: MetricsConfig,
    pub sla: SlaThresholds,
    pub alerts: AlertConfig,
    pub breaker: BreakerSettings,
    pub errors: ErrorHandlingConfig,
    pub audit: AuditConfig,
    pub correlation: CorrelationConfig,
    pub maintenance_interval_secs: u64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            metrics: MetricsConfig::default(),
            sla: SlaThresholds::default(),
            alerts: AlertConfig::default(),
            breaker: BreakerSettings::default(),
            errors: ErrorHandlingConfig::default(),
            audit: AuditConfig::default(),
            correlation: CorrelationConfig::default(),
            maintenance_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serialized values longer than this many bytes are compressed
    pub compression_threshold: usize,
    pub compression_level: i32,
    pub store_timeout_ms: u64,
    pub max_key_len: usize,
    pub ttl_policy: TtlPolicyConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            compression_threshold: 1024,
            compression_level: 3,
            store_timeout_ms: 250,
            max_key_len: 512,
            ttl_policy: TtlPolicyConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub raw_sample_retention_hours: u64,
    pub aggregate_retention_days: u64,
    pub max_samples_per_operation: usize,
    pub ema_alpha: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            raw_sample_retention_hours: 24,
            aggregate_retention_days: 7,
            max_samples_per_operation: 10_000,
            ema_alpha: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub retention_hours: u64,
    pub max_alerts: usize,
    /// Hit rate is only judged once this many lookups have happened
    pub min_hit_rate_lookups: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            retention_hours: 24,
            max_alerts: 1000,
            min_hit_rate_lookups: 100,
        }
    }
}

/// Defaults applied to every circuit breaker the registry creates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_secs: u64,
    pub half_open_max_calls: u32,
    pub failure_window_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_secs: 60,
            half_open_max_calls: 3,
            failure_window_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorHandlingConfig {
    /// How many handled errors are kept for reporting
    pub recent_errors: usize,
}

impl Default for ErrorHandlingConfig {
    fn default() -> Self {
        Self { recent_errors: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub queue_capacity: usize,
    /// Append audit events to this JSON lines file instead of the log
    pub jsonl_path: Option<PathBuf>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            jsonl_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub max_age_hours: u64,
    pub sweep_interval_secs: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_age_hours: 24,
            sweep_interval_secs: 300,
        }
    }
}

impl CorrelationConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_hours * 3600)
    }
}

impl PerformanceConfig {
    /// Reject inverted thresholds, zero capacities and out-of-range knobs
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.sla.problems();

        if self.cache.compression_threshold == 0 {
            problems.push("cache.compression_threshold must be greater than 0".into());
        }
        if !(1..=22).contains(&self.cache.compression_level) {
            problems.push(format!(
                "cache.compression_level must be within 1..=22, got {}",
                self.cache.compression_level
            ));
        }
        if self.cache.store_timeout_ms == 0 {
            problems.push("cache.store_timeout_ms must be greater than 0".into());
        }
        if self.cache.max_key_len == 0 {
            problems.push("cache.max_key_len must be greater than 0".into());
        }
        if self.metrics.max_samples_per_operation == 0 {
            problems.push("metrics.max_samples_per_operation must be greater than 0".into());
        }
        if self.metrics.raw_sample_retention_hours == 0 || self.metrics.aggregate_retention_days == 0
        {
            problems.push("metrics retention windows must be greater than 0".into());
        }
        if !(self.metrics.ema_alpha > 0.0 && self.metrics.ema_alpha <= 1.0) {
            problems.push(format!(
                "metrics.ema_alpha must be within (0, 1], got {}",
                self.metrics.ema_alpha
            ));
        }
        if self.alerts.max_alerts == 0 {
            problems.push("alerts.max_alerts must be greater than 0".into());
        }
        if self.breaker.failure_threshold == 0
            || self.breaker.success_threshold == 0
            || self.breaker.half_open_max_calls == 0
        {
            problems.push("breaker thresholds must be greater than 0".into());
        }
        if self.audit.queue_capacity == 0 {
            problems.push("audit.queue_capacity must be greater than 0".into());
        }
        if self.errors.recent_errors == 0 {
            problems.push("errors.recent_errors must be greater than 0".into());
        }
        if self.maintenance_interval_secs == 0 {
            problems.push("maintenance_interval_secs must be greater than 0".into());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::configuration(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PerformanceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_yields_defaults() {
        let config: PerformanceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PerformanceConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: PerformanceConfig =
            serde_json::from_str(r#"{"sla": {"api_response_time_critical_ms": 2000}}"#).unwrap();
        assert_eq!(config.sla.api_response_time_critical_ms, 2000.0);
        assert_eq!(config.sla.api_response_time_warning_ms, 500.0);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = PerformanceConfig::default();
        config.sla.db_query_warning_ms = 600.0;
        config.audit.queue_capacity = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("db_query warning threshold"));
        assert!(err.contains("audit.queue_capacity"));
    }

    #[test]
    fn test_inverted_hit_rate_rejected() {
        let mut config = PerformanceConfig::default();
        config.sla.cache_hit_rate_critical_pct = 80.0;
        assert!(config.validate().is_err());
    }
}
