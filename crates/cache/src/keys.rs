//! Cache key validation and prefix extraction

use crate::errors::{CacheError, RecoveryHint, Result};

/// Default upper bound on key length in bytes
pub const DEFAULT_MAX_KEY_LEN: usize = 512;

/// Reject keys the store should never see.
///
/// Keys must be non-empty, at most `max_len` bytes and free of whitespace
/// and control characters.
pub fn validate_key(key: &str, max_len: usize) -> Result<()> {
    let reason = if key.is_empty() {
        Some("key is empty".to_string())
    } else if key.len() > max_len {
        Some(format!("key is {} bytes, limit is {max_len}", key.len()))
    } else if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("key contains whitespace or control characters".to_string())
    } else {
        None
    };

    match reason {
        None => Ok(()),
        Some(reason) => Err(CacheError::InvalidKey {
            key: truncate_for_display(key),
            reason,
            recovery_hint: RecoveryHint::FixInput {
                instructions: "Build keys as '<resource>:<id>' without spaces".to_string(),
            },
        }),
    }
}

/// Resource type of a key: everything before the first `:`
pub fn key_prefix(key: &str) -> &str {
    key.split(':').next().unwrap_or(key)
}

fn truncate_for_display(key: &str) -> String {
    const LIMIT: usize = 64;
    if key.len() <= LIMIT {
        return key.to_string();
    }
    let mut end = LIMIT;
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &key[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert!(validate_key("product:1", DEFAULT_MAX_KEY_LEN).is_ok());
        assert!(validate_key("search:q=botas&page=2", DEFAULT_MAX_KEY_LEN).is_ok());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(validate_key("", DEFAULT_MAX_KEY_LEN).is_err());
        assert!(validate_key("product 1", DEFAULT_MAX_KEY_LEN).is_err());
        assert!(validate_key("cart:\n1", DEFAULT_MAX_KEY_LEN).is_err());
        assert!(validate_key(&"k".repeat(513), DEFAULT_MAX_KEY_LEN).is_err());
        assert!(validate_key(&"k".repeat(512), DEFAULT_MAX_KEY_LEN).is_ok());
    }

    #[test]
    fn test_long_key_truncated_in_error() {
        let err = validate_key(&"ñ".repeat(400), DEFAULT_MAX_KEY_LEN).unwrap_err();
        match err {
            CacheError::InvalidKey { key, .. } => assert!(key.len() <= 67),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key_prefix("product:1:reviews"), "product");
        assert_eq!(key_prefix("session"), "session");
    }
}
