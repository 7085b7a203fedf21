//! Summary statistics over a lookback window

use serde::{Deserialize, Serialize};

/// Aggregate view of one operation over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub operation: String,
    pub window_hours: u32,
    pub count: u64,
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    /// Percentiles are `None` when no raw samples remain for the window
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    /// Exponential moving average over the operation's whole history
    pub ema_ms: Option<f64>,
    /// Percentiles were computed from an incomplete sample set
    pub sampled: bool,
}

/// Nearest-rank percentile of an ascending slice.
///
/// Uses the 1-based rank `ceil(p * n)`, so `p = 0.95` over 20 values is
/// the 19th value.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let n = sorted.len();
    let rank = ((p * n as f64).ceil() as usize).clamp(1, n);
    sorted.get(rank - 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_rank() {
        let values: Vec<f64> = (1..=20u32).map(f64::from).collect();
        assert_eq!(percentile(&values, 0.95), Some(19.0));
        assert_eq!(percentile(&values, 0.5), Some(10.0));
        assert_eq!(percentile(&values, 0.99), Some(20.0));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 1.0), Some(20.0));
    }

    #[test]
    fn test_small_sets() {
        assert_eq!(percentile(&[], 0.5), None);
        assert_eq!(percentile(&[7.0], 0.99), Some(7.0));
        assert_eq!(percentile(&[1.0, 2.0], 0.5), Some(1.0));
        assert_eq!(percentile(&[1.0], 1.5), None);
    }
}
