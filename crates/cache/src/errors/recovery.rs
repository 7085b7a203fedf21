//! Recovery utilities for cache errors

use super::types::{CacheError, RecoveryHint};

impl CacheError {
    /// Get the recovery hint for this error
    #[must_use]
    pub const fn recovery_hint(&self) -> &RecoveryHint {
        match self {
            Self::InvalidKey { recovery_hint, .. }
            | Self::InvalidPattern { recovery_hint, .. }
            | Self::Serialization { recovery_hint, .. }
            | Self::Compression { recovery_hint, .. }
            | Self::Corruption { recovery_hint, .. }
            | Self::StoreUnavailable { recovery_hint, .. }
            | Self::Timeout { recovery_hint, .. }
            | Self::Unsupported { recovery_hint, .. } => recovery_hint,
        }
    }

    /// Check if this error is transient and can be retried
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.recovery_hint(), RecoveryHint::Retry { .. })
    }

    /// Check if this error indicates a stored entry that cannot be decoded
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corruption { .. }
                | Self::Compression {
                    operation: "decompress",
                    ..
                }
                | Self::Serialization {
                    operation: super::types::SerializationOp::Deserialize,
                    ..
                }
        )
    }

    /// Get error type for metrics
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidKey { .. } => "invalid_key",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::Serialization { .. } => "serialization",
            Self::Compression { .. } => "compression",
            Self::Corruption { .. } => "corruption",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}
