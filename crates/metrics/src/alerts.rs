//! Threshold alerts
//!
//! Alerts are immutable once raised. The evaluator keeps them in arrival
//! order, bounded by count and by age.

use crate::sample::hours_before;
use crate::sla::OperationKind;
use chrono::{DateTime, Utc};
use mercado_core::config::AlertConfig;
use mercado_core::SlaThresholds;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether larger values are worse (latency) or better (hit rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsWorse,
    LowerIsWorse,
}

/// A warning/critical pair for one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub warning: f64,
    pub critical: f64,
    pub direction: Direction,
}

impl Threshold {
    pub fn upper(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: Direction::HigherIsWorse,
        }
    }

    pub fn lower(warning: f64, critical: f64) -> Self {
        Self {
            warning,
            critical,
            direction: Direction::LowerIsWorse,
        }
    }

    /// Severity `value` crosses, comparing strictly
    pub fn classify(&self, value: f64) -> Option<(AlertSeverity, f64)> {
        let crosses = |limit: f64| match self.direction {
            Direction::HigherIsWorse => value > limit,
            Direction::LowerIsWorse => value < limit,
        };
        if crosses(self.critical) {
            Some((AlertSeverity::Critical, self.critical))
        } else if crosses(self.warning) {
            Some((AlertSeverity::Warning, self.warning))
        } else {
            None
        }
    }
}

/// A crossed threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub metric_name: String,
    pub current_value: f64,
    pub threshold: f64,
    pub severity: AlertSeverity,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Alert totals by severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCounts {
    pub warning: usize,
    pub critical: usize,
}

/// Compares values against SLA thresholds and keeps the alerts it raises
pub struct AlertEvaluator {
    thresholds: SlaThresholds,
    retention_hours: u64,
    max_alerts: usize,
    alerts: RwLock<VecDeque<Alert>>,
}

impl AlertEvaluator {
    pub fn new(thresholds: SlaThresholds, config: &AlertConfig) -> Self {
        Self {
            thresholds,
            retention_hours: config.retention_hours,
            max_alerts: config.max_alerts.max(1),
            alerts: RwLock::new(VecDeque::new()),
        }
    }

    pub fn thresholds(&self) -> &SlaThresholds {
        &self.thresholds
    }

    /// Check one operation latency
    pub fn check_latency(
        &self,
        metric_name: &str,
        duration_ms: f64,
        kind: OperationKind,
    ) -> Option<Alert> {
        let (warning, critical) = kind.latency_limits(&self.thresholds);
        self.evaluate(metric_name, duration_ms, Threshold::upper(warning, critical))
    }

    /// Check a cache hit rate in percent; lower is worse
    pub fn check_hit_rate(&self, metric_name: &str, hit_rate_pct: f64) -> Option<Alert> {
        let threshold = Threshold::lower(
            self.thresholds.cache_hit_rate_warning_pct,
            self.thresholds.cache_hit_rate_critical_pct,
        );
        self.evaluate(metric_name, hit_rate_pct, threshold)
    }

    pub fn check_cpu(&self, metric_name: &str, usage_pct: f64) -> Option<Alert> {
        let threshold =
            Threshold::upper(self.thresholds.cpu_warning_pct, self.thresholds.cpu_critical_pct);
        self.evaluate(metric_name, usage_pct, threshold)
    }

    pub fn check_memory(&self, metric_name: &str, usage_pct: f64) -> Option<Alert> {
        let threshold = Threshold::upper(
            self.thresholds.memory_warning_pct,
            self.thresholds.memory_critical_pct,
        );
        self.evaluate(metric_name, usage_pct, threshold)
    }

    /// Raise and store an alert if `value` crosses `threshold`
    pub fn evaluate(&self, metric_name: &str, value: f64, threshold: Threshold) -> Option<Alert> {
        self.evaluate_at(metric_name, value, threshold, Utc::now())
    }

    pub fn evaluate_at(
        &self,
        metric_name: &str,
        value: f64,
        threshold: Threshold,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        if !value.is_finite() {
            return None;
        }
        let (severity, limit) = threshold.classify(value)?;
        let relation = match threshold.direction {
            Direction::HigherIsWorse => "above",
            Direction::LowerIsWorse => "below",
        };
        let alert = Alert {
            id: Uuid::new_v4(),
            metric_name: metric_name.to_string(),
            current_value: value,
            threshold: limit,
            severity,
            timestamp: now,
            message: format!(
                "{metric_name} is {value:.2}, {relation} the {severity} threshold of {limit:.2}"
            ),
        };

        match severity {
            AlertSeverity::Critical => error!(
                metric = metric_name,
                value,
                threshold = limit,
                "Critical SLA threshold crossed"
            ),
            AlertSeverity::Warning => warn!(
                metric = metric_name,
                value,
                threshold = limit,
                "SLA warning threshold crossed"
            ),
        }

        let mut alerts = self.alerts.write();
        alerts.push_back(alert.clone());
        while alerts.len() > self.max_alerts {
            alerts.pop_front();
        }
        Some(alert)
    }

    /// Alerts raised in the last `hours` hours, newest first
    pub fn active_alerts(&self, hours: u32) -> Vec<Alert> {
        self.active_alerts_at(hours, Utc::now())
    }

    pub fn active_alerts_at(&self, hours: u32, now: DateTime<Utc>) -> Vec<Alert> {
        let since = hours_before(now, u64::from(hours));
        let mut active: Vec<Alert> = self
            .alerts
            .read()
            .iter()
            .filter(|alert| alert.timestamp >= since && alert.timestamp <= now)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        active
    }

    pub fn counts(&self) -> AlertCounts {
        self.alerts
            .read()
            .iter()
            .fold(AlertCounts::default(), |mut counts, alert| {
                match alert.severity {
                    AlertSeverity::Warning => counts.warning += 1,
                    AlertSeverity::Critical => counts.critical += 1,
                }
                counts
            })
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }

    /// Drop alerts older than the retention window
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = hours_before(now, self.retention_hours);
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|alert| alert.timestamp >= cutoff);
        before - alerts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn evaluator() -> AlertEvaluator {
        AlertEvaluator::new(SlaThresholds::default(), &AlertConfig::default())
    }

    #[test]
    fn test_latency_below_critical_is_not_critical() {
        let alerts = evaluator();
        for _ in 0..10 {
            alerts.check_latency("GET /orders", 800.0, OperationKind::Api);
        }
        let counts = alerts.counts();
        assert_eq!(counts.critical, 0);
        assert_eq!(counts.warning, 10);

        let alert = alerts
            .check_latency("GET /orders", 1200.0, OperationKind::Api)
            .unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.threshold, 1000.0);
        assert_eq!(alerts.counts().critical, 1);
    }

    #[test]
    fn test_comparison_is_strict() {
        let alerts = evaluator();
        assert!(alerts.check_latency("op", 500.0, OperationKind::Api).is_none());
        assert_eq!(
            alerts
                .check_latency("op", 1000.0, OperationKind::Api)
                .map(|a| a.severity),
            Some(AlertSeverity::Warning)
        );
        assert!(alerts.check_hit_rate("cache.hit_rate", 70.0).is_none());
    }

    #[test]
    fn test_hit_rate_lower_is_worse() {
        let alerts = evaluator();
        assert!(alerts.check_hit_rate("cache.hit_rate", 95.0).is_none());
        assert_eq!(
            alerts.check_hit_rate("cache.hit_rate", 65.0).unwrap().severity,
            AlertSeverity::Warning
        );
        let critical = alerts.check_hit_rate("cache.hit_rate", 30.0).unwrap();
        assert_eq!(critical.severity, AlertSeverity::Critical);
        assert!(critical.message.contains("below"));
    }

    #[test]
    fn test_db_kind_uses_db_limits() {
        let alerts = evaluator();
        let alert = alerts
            .check_latency("select_orders", 600.0, OperationKind::Database)
            .unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.threshold, 500.0);
    }

    #[test]
    fn test_system_checks() {
        let alerts = evaluator();
        assert_eq!(
            alerts.check_cpu("system.cpu_usage", 96.0).map(|a| a.severity),
            Some(AlertSeverity::Critical)
        );
        assert_eq!(
            alerts.check_memory("system.memory_usage", 85.0).map(|a| a.severity),
            Some(AlertSeverity::Warning)
        );
        assert!(alerts.check_memory("system.memory_usage", f64::NAN).is_none());
    }

    #[test]
    fn test_active_window_and_purge() {
        let alerts = evaluator();
        let now = Utc::now();
        let t = Threshold::upper(1.0, 2.0);
        alerts.evaluate_at("a", 5.0, t, now - ChronoDuration::hours(30));
        alerts.evaluate_at("b", 5.0, t, now - ChronoDuration::hours(2));
        alerts.evaluate_at("c", 5.0, t, now - ChronoDuration::minutes(5));

        let active: Vec<_> = alerts
            .active_alerts_at(3, now)
            .into_iter()
            .map(|a| a.metric_name)
            .collect();
        assert_eq!(active, vec!["c", "b"]);

        assert_eq!(alerts.purge_expired_at(now), 1);
        assert_eq!(alerts.len(), 2);
    }

    #[test]
    fn test_huge_windows_saturate() {
        let alerts = AlertEvaluator::new(
            SlaThresholds::default(),
            &AlertConfig {
                retention_hours: u64::MAX,
                ..AlertConfig::default()
            },
        );
        alerts.check_cpu("system.cpu_usage", 99.0);

        assert_eq!(alerts.active_alerts(u32::MAX).len(), 1);
        assert_eq!(alerts.purge_expired(), 0);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_bounded() {
        let alerts = AlertEvaluator::new(
            SlaThresholds::default(),
            &AlertConfig {
                max_alerts: 3,
                ..AlertConfig::default()
            },
        );
        for i in 0..5 {
            alerts.check_cpu(&format!("cpu{i}"), 99.0);
        }
        let names: Vec<_> = alerts
            .active_alerts(1)
            .into_iter()
            .map(|a| a.metric_name)
            .collect();
        assert_eq!(names.len(), 3);
        assert!(!names.contains(&"cpu0".to_string()));
    }
}
