/// Constants shared across the mercado performance layer

// Environment variable names
pub const MERCADO_CONFIG_VAR: &str = "MERCADO_CONFIG";
pub const MERCADO_LOG_VAR: &str = "MERCADO_LOG";

// Configuration overrides
pub const ENV_CACHE_COMPRESSION_THRESHOLD: &str = "MERCADO_CACHE_COMPRESSION_THRESHOLD";
pub const ENV_CACHE_STORE_TIMEOUT_MS: &str = "MERCADO_CACHE_STORE_TIMEOUT_MS";
pub const ENV_SLA_API_WARNING_MS: &str = "MERCADO_SLA_API_WARNING_MS";
pub const ENV_SLA_API_CRITICAL_MS: &str = "MERCADO_SLA_API_CRITICAL_MS";
pub const ENV_SLA_DB_WARNING_MS: &str = "MERCADO_SLA_DB_WARNING_MS";
pub const ENV_SLA_DB_CRITICAL_MS: &str = "MERCADO_SLA_DB_CRITICAL_MS";
pub const ENV_AUDIT_QUEUE_CAPACITY: &str = "MERCADO_AUDIT_QUEUE_CAPACITY";
pub const ENV_MAINTENANCE_INTERVAL_SECS: &str = "MERCADO_MAINTENANCE_INTERVAL_SECS";

// Tags understood by the orchestrator
pub const TAG_KIND: &str = "kind";
pub const TAG_KIND_DB: &str = "db";
pub const TAG_STATUS: &str = "status";
pub const TAG_RESULT: &str = "result";

// Metric names produced by the orchestrator
pub const CACHE_LOOKUP_OPERATION: &str = "cache.lookup";
pub const CACHE_HIT_RATE_METRIC: &str = "cache.hit_rate";
pub const CPU_USAGE_METRIC: &str = "system.cpu_usage";
pub const MEMORY_USAGE_METRIC: &str = "system.memory_usage";
