//! Resource-class TTL policy

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// How volatile a resource type is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    Short,
    Medium,
    Long,
}

/// Prefix-to-class table plus per-class durations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicyConfig {
    pub short_secs: u64,
    pub medium_secs: u64,
    pub long_secs: u64,
    pub default_secs: u64,
    /// Key prefix (text before the first `:`) to TTL class
    pub classes: HashMap<String, TtlClass>,
}

const SHORT_PREFIXES: &[&str] = &["order", "cart", "transaction", "payment", "inventory", "session"];
const MEDIUM_PREFIXES: &[&str] = &["product", "catalog", "vendor", "search", "user"];
const LONG_PREFIXES: &[&str] = &["category", "config", "reference", "static", "location"];

impl Default for TtlPolicyConfig {
    fn default() -> Self {
        let mut classes = HashMap::new();
        for (prefixes, class) in [
            (SHORT_PREFIXES, TtlClass::Short),
            (MEDIUM_PREFIXES, TtlClass::Medium),
            (LONG_PREFIXES, TtlClass::Long),
        ] {
            for prefix in prefixes {
                classes.insert((*prefix).to_string(), class);
            }
        }
        Self {
            short_secs: 300,
            medium_secs: 1800,
            long_secs: 86_400,
            default_secs: 3600,
            classes,
        }
    }
}

impl TtlPolicyConfig {
    pub fn duration_for_class(&self, class: TtlClass) -> Duration {
        Duration::from_secs(match class {
            TtlClass::Short => self.short_secs,
            TtlClass::Medium => self.medium_secs,
            TtlClass::Long => self.long_secs,
        })
    }

    pub fn class_for_key(&self, key: &str) -> Option<TtlClass> {
        let prefix = key.split(':').next().unwrap_or(key);
        self.classes.get(prefix).copied()
    }

    /// TTL for a cache key, falling back to the default for unknown prefixes
    pub fn ttl_for_key(&self, key: &str) -> Duration {
        self.class_for_key(key)
            .map_or(Duration::from_secs(self.default_secs), |class| {
                self.duration_for_class(class)
            })
    }
}
