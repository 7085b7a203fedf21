//! Core error type definitions

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for performance-layer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error used to carry foreign errors through the source chain
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type raised by business code and the performance layer
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database query or connection failures
    #[error("database operation '{operation}' failed: {message}")]
    Database {
        operation: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Calls to volatile third-party services
    #[error("external service '{service}' failed: {message}")]
    ExternalService {
        service: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Payment gateway failures
    #[error("payment provider '{provider}' failed: {message}")]
    Payment { provider: String, message: String },

    /// Input rejected by validation
    #[error("validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Missing or invalid credentials
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Authenticated principal lacks permission
    #[error("permission denied for {action}: {message}")]
    Authorization { action: String, message: String },

    /// Suspicious or malicious activity
    #[error("security violation: {message}")]
    Security { message: String },

    /// Performance budget exceeded
    #[error("performance degradation in '{operation}': {message}")]
    Performance { operation: String, message: String },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// A circuit breaker rejected the call without attempting it
    #[error("service '{service}' is temporarily unavailable, retry after {retry_after:?}")]
    CircuitOpen {
        service: String,
        retry_after: Duration,
    },

    /// Cache layer failures surfaced explicitly
    #[error("cache operation '{operation}' failed: {message}")]
    Cache { operation: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{}': {source}", path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other failure, optionally wrapping a foreign error
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<BoxError>,
    },
}
