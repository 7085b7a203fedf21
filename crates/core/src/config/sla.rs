//! Service-level thresholds

use serde::{Deserialize, Serialize};

/// Warning and critical limits the alert evaluator checks against.
///
/// Latencies are milliseconds, everything else percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaThresholds {
    pub api_response_time_warning_ms: f64,
    pub api_response_time_critical_ms: f64,
    pub db_query_warning_ms: f64,
    pub db_query_critical_ms: f64,
    pub slow_query_ms: f64,
    pub cache_hit_rate_warning_pct: f64,
    pub cache_hit_rate_critical_pct: f64,
    pub cpu_warning_pct: f64,
    pub cpu_critical_pct: f64,
    pub memory_warning_pct: f64,
    pub memory_critical_pct: f64,
}

impl Default for SlaThresholds {
    fn default() -> Self {
        Self {
            api_response_time_warning_ms: 500.0,
            api_response_time_critical_ms: 1000.0,
            db_query_warning_ms: 200.0,
            db_query_critical_ms: 500.0,
            slow_query_ms: 1000.0,
            cache_hit_rate_warning_pct: 70.0,
            cache_hit_rate_critical_pct: 50.0,
            cpu_warning_pct: 80.0,
            cpu_critical_pct: 95.0,
            memory_warning_pct: 80.0,
            memory_critical_pct: 90.0,
        }
    }
}

impl SlaThresholds {
    /// Describe every inverted or non-positive pair
    pub(crate) fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let higher_is_worse = [
            (
                "api_response_time",
                self.api_response_time_warning_ms,
                self.api_response_time_critical_ms,
            ),
            ("db_query", self.db_query_warning_ms, self.db_query_critical_ms),
            ("cpu", self.cpu_warning_pct, self.cpu_critical_pct),
            ("memory", self.memory_warning_pct, self.memory_critical_pct),
        ];
        for (name, warning, critical) in higher_is_worse {
            if !(warning > 0.0 && warning.is_finite() && critical.is_finite()) {
                problems.push(format!("{name} thresholds must be positive and finite"));
            } else if warning >= critical {
                problems.push(format!(
                    "{name} warning threshold ({warning}) must be below critical ({critical})"
                ));
            }
        }
        if !(self.slow_query_ms > 0.0 && self.slow_query_ms.is_finite()) {
            problems.push("slow_query_ms must be positive and finite".to_string());
        }
        if self.cache_hit_rate_critical_pct >= self.cache_hit_rate_warning_pct {
            problems.push(format!(
                "cache hit rate critical threshold ({}) must be below warning ({})",
                self.cache_hit_rate_critical_pct, self.cache_hit_rate_warning_pct
            ));
        }
        problems
    }
}
