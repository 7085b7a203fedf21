//! Error conversion utilities

use super::types::{CacheError, RecoveryHint, SerializationOp};

/// Convert serde_json errors to cache errors
impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            key: String::new(),
            operation: SerializationOp::Deserialize,
            source: Box::new(error),
            recovery_hint: RecoveryHint::ClearAndRetry,
        }
    }
}

/// Convert cache errors to core errors
impl From<CacheError> for mercado_core::Error {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Timeout {
                operation,
                duration,
                ..
            } => mercado_core::Error::timeout(format!("cache {operation}"), duration),
            other => mercado_core::Error::cache(other.error_type(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timeout_maps_to_core_timeout() {
        let err = CacheError::Timeout {
            operation: "get",
            duration: Duration::from_millis(250),
            recovery_hint: RecoveryHint::UseFallback,
        };
        let core: mercado_core::Error = err.into();
        assert!(matches!(core, mercado_core::Error::Timeout { .. }));
    }

    #[test]
    fn test_other_errors_map_to_cache_variant() {
        let err = CacheError::Corruption {
            key: "product:1".into(),
            reason: "unknown encoding tag 0x07".into(),
            recovery_hint: RecoveryHint::ClearAndRetry,
        };
        assert!(err.is_corruption());
        assert!(!err.is_transient());

        let core: mercado_core::Error = err.into();
        match core {
            mercado_core::Error::Cache { operation, message } => {
                assert_eq!(operation, "corruption");
                assert!(message.contains("product:1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
