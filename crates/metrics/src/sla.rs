//! SLA compliance of operation summaries

use crate::summary::MetricSummary;
use mercado_core::{SlaThresholds, TAG_KIND, TAG_KIND_DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which latency thresholds an operation is judged against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Api,
    Database,
}

impl OperationKind {
    /// `kind=db` selects database thresholds, anything else is API
    pub fn from_tags(tags: &BTreeMap<String, String>) -> Self {
        match tags.get(TAG_KIND).map(String::as_str) {
            Some(TAG_KIND_DB) => Self::Database,
            _ => Self::Api,
        }
    }

    /// `(warning_ms, critical_ms)` for this kind
    pub fn latency_limits(self, sla: &SlaThresholds) -> (f64, f64) {
        match self {
            Self::Api => (
                sla.api_response_time_warning_ms,
                sla.api_response_time_critical_ms,
            ),
            Self::Database => (sla.db_query_warning_ms, sla.db_query_critical_ms),
        }
    }
}

/// Pass/fail flags for one summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaCompliance {
    pub kind: OperationKind,
    pub mean_under_warning: bool,
    pub p95_under_warning: bool,
    pub p99_under_critical: bool,
    pub violations: u32,
    /// 100 with no violations, strictly lower with each one
    pub score: f64,
}

impl SlaCompliance {
    /// Judge a summary; missing percentiles count as passing
    pub fn evaluate(summary: &MetricSummary, kind: OperationKind, sla: &SlaThresholds) -> Self {
        let (warning, critical) = kind.latency_limits(sla);

        let mean_under_warning = summary.avg_ms < warning;
        let p95_under_warning = summary.p95_ms.map_or(true, |p| p < warning);
        let p99_under_critical = summary.p99_ms.map_or(true, |p| p < critical);

        let violations = [mean_under_warning, p95_under_warning, p99_under_critical]
            .iter()
            .filter(|passed| !**passed)
            .count() as u32;

        Self {
            kind,
            mean_under_warning,
            p95_under_warning,
            p99_under_critical,
            violations,
            score: compliance_score(violations),
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.violations == 0
    }
}

/// `100 * 0.95^violations`
pub fn compliance_score(violations: u32) -> f64 {
    100.0 * 0.95f64.powi(i32::try_from(violations).unwrap_or(i32::MAX))
}
