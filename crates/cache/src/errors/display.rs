//! Display implementations for cache errors

use super::types::{CacheError, StoreType};
use std::fmt;

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey { key, reason, .. } => {
                write!(f, "Invalid cache key '{key}': {reason}")
            }
            Self::InvalidPattern {
                pattern, reason, ..
            } => write!(f, "Invalid cache key pattern '{pattern}': {reason}"),
            Self::Serialization {
                key,
                operation,
                source,
                ..
            } => write!(f, "Failed to {operation:?} cache entry '{key}': {source}"),
            Self::Compression {
                operation, source, ..
            } => write!(f, "Compression error during {operation}: {source}"),
            Self::Corruption { key, reason, .. } => {
                write!(f, "Cache corruption detected for key '{key}': {reason}")
            }
            Self::StoreUnavailable {
                store_type, reason, ..
            } => write!(f, "Cache store {store_type} unavailable: {reason}"),
            Self::Timeout {
                operation,
                duration,
                ..
            } => write!(f, "Timeout during cache {operation} after {duration:?}"),
            Self::Unsupported {
                operation,
                store_type,
                ..
            } => write!(f, "Cache store {store_type} does not support {operation}"),
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::Memory => f.write_str("memory"),
            StoreType::Custom(name) => f.write_str(name),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialization { source, .. } | Self::Compression { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}
