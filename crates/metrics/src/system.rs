//! Host resource snapshots

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// CPU and memory usage at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    pub cpu_usage_pct: f64,
    pub memory_usage_pct: f64,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    /// 1, 5 and 15 minute load averages; zero where the OS has none
    pub load_average: [f64; 3],
    pub timestamp: DateTime<Utc>,
}

/// Source of host resource usage
pub trait SystemCollector: Send + Sync {
    fn snapshot(&self) -> SystemSnapshot;
}

/// Reads the local host through `sysinfo`
pub struct SysinfoCollector {
    system: Mutex<System>,
}

impl SysinfoCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCollector for SysinfoCollector {
    fn snapshot(&self) -> SystemSnapshot {
        let mut system = self.system.lock();
        system.refresh_cpu();
        system.refresh_memory();

        let total = system.total_memory();
        let used = system.used_memory();
        let memory_usage_pct = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };
        let load = System::load_average();

        SystemSnapshot {
            cpu_usage_pct: f64::from(system.global_cpu_info().cpu_usage()),
            memory_usage_pct,
            memory_used_bytes: used,
            memory_total_bytes: total,
            load_average: [load.one, load.five, load.fifteen],
            timestamp: Utc::now(),
        }
    }
}

/// Collector reporting fixed values, for tests and synthetic load
#[derive(Debug, Clone, Copy)]
pub struct FixedSystemCollector {
    pub cpu_usage_pct: f64,
    pub memory_usage_pct: f64,
}

impl FixedSystemCollector {
    pub fn new(cpu_usage_pct: f64, memory_usage_pct: f64) -> Self {
        Self {
            cpu_usage_pct,
            memory_usage_pct,
        }
    }
}

impl SystemCollector for FixedSystemCollector {
    fn snapshot(&self) -> SystemSnapshot {
        const TOTAL: u64 = 16 * 1024 * 1024 * 1024;
        SystemSnapshot {
            cpu_usage_pct: self.cpu_usage_pct,
            memory_usage_pct: self.memory_usage_pct,
            memory_used_bytes: (TOTAL as f64 * self.memory_usage_pct / 100.0) as u64,
            memory_total_bytes: TOTAL,
            load_average: [0.0; 3],
            timestamp: Utc::now(),
        }
    }
}
