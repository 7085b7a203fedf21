//! Core error types for the cache layer

use std::time::Duration;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    /// Key failed validation before reaching the store
    InvalidKey {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Glob pattern could not be compiled
    InvalidPattern {
        pattern: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Serialization/deserialization errors
    Serialization {
        key: String,
        operation: SerializationOp,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// Compression/decompression error
    Compression {
        operation: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
        recovery_hint: RecoveryHint,
    },

    /// Stored bytes are not a valid tagged payload
    Corruption {
        key: String,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Cache store unavailable
    StoreUnavailable {
        store_type: StoreType,
        reason: String,
        recovery_hint: RecoveryHint,
    },

    /// Store call exceeded the per-call budget
    Timeout {
        operation: &'static str,
        duration: Duration,
        recovery_hint: RecoveryHint,
    },

    /// The store does not implement an optional operation
    Unsupported {
        operation: &'static str,
        store_type: StoreType,
        recovery_hint: RecoveryHint,
    },

}

/// What a caller can do about a cache failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// The store may answer if asked again after `after`
    Retry { after: Duration },
    /// Drop the entry and recompute the value
    ClearAndRetry,
    /// Bypass the cache and compute directly
    UseFallback,
    /// Fix the caller-supplied key or pattern
    FixInput { instructions: String },
    NoRecovery,
}

/// Serialization operation types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationOp {
    Serialize,
    Deserialize,
}

/// Backend behind a [`CacheStore`](crate::CacheStore), for logs and reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    Memory,
    /// A shared store supplied by the embedding service, named by it
    Custom(String),
}
