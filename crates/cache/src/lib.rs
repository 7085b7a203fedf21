//! Fail-open value cache for the mercado performance layer
//!
//! [`CacheService`] serializes values to JSON, compresses large payloads
//! with zstd behind a one-byte tag, picks TTLs from a resource-class policy
//! and counts every operation. Store failures never reach callers.
//!
//! ```no_run
//! use mercado_cache::CacheService;
//! use mercado_core::config::CacheConfig;
//!
//! # async fn demo() {
//! let cache = CacheService::in_memory(&CacheConfig::default());
//! cache.set("product:1", &serde_json::json!({"name": "X"}), None).await;
//! let hit: Option<serde_json::Value> = cache.get("product:1").await;
//! # }
//! ```

pub mod codec;
pub mod errors;
pub mod keys;
pub mod service;
pub mod stats;
pub mod store;

pub use codec::{Codec, CompressionConfig, Encoded, TAG_RAW, TAG_ZSTD};
pub use errors::{CacheError, RecoveryHint, Result, SerializationOp, StoreType};
pub use keys::{key_prefix, validate_key};
pub use service::CacheService;
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use store::{CacheStore, MemoryStore, UnavailableStore};
