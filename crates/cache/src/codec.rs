//! Serialization codec for cached values
//!
//! Values are serialized to JSON. Payloads longer than the configured
//! threshold are zstd-compressed when that actually makes them smaller.
//! Every stored payload starts with a one-byte encoding tag so `decode`
//! never needs outside information.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use mercado_core::config::CacheConfig;
use serde::{de::DeserializeOwned, Serialize};
use zstd::stream::{decode_all as zstd_decode, encode_all as zstd_encode};

/// Payload is plain JSON
pub const TAG_RAW: u8 = 0x00;
/// Payload is zstd-compressed JSON
pub const TAG_ZSTD: u8 = 0x01;

/// Default zstd level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Compression configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Whether compression is enabled
    pub enabled: bool,
    /// Compression level (1-22 for zstd, default 3)
    pub level: i32,
    /// Payloads must be longer than this many bytes to be compressed
    pub min_size: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: DEFAULT_COMPRESSION_LEVEL,
            min_size: 1024,
        }
    }
}

impl From<&CacheConfig> for CompressionConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            enabled: true,
            level: config.compression_level,
            min_size: config.compression_threshold,
        }
    }
}

/// Result of encoding one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Tagged payload ready for the store
    pub bytes: Vec<u8>,
    pub compressed: bool,
    /// Bytes saved compared to the raw JSON form
    pub bytes_saved: u64,
}

/// Stateless encoder/decoder
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    config: CompressionConfig,
}

impl Codec {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Serialize and tag `value`
    pub fn encode<T>(&self, key: &str, value: &T) -> Result<Encoded>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Serialize,
            source: Box::new(e),
            recovery_hint: RecoveryHint::FixInput {
                instructions: "Value must be representable as JSON".to_string(),
            },
        })?;
        self.encode_json(json)
    }

    /// Tag an already-serialized JSON payload, compressing when worthwhile
    pub fn encode_json(&self, json: Vec<u8>) -> Result<Encoded> {
        if self.config.enabled && json.len() > self.config.min_size {
            let compressed =
                zstd_encode(json.as_slice(), self.config.level).map_err(|e| {
                    CacheError::Compression {
                        operation: "compress",
                        source: Box::new(e),
                        recovery_hint: RecoveryHint::UseFallback,
                    }
                })?;

            if compressed.len() < json.len() {
                tracing::trace!(
                    original = json.len(),
                    compressed = compressed.len(),
                    "Compressed cache payload"
                );
                let bytes_saved = (json.len() - compressed.len()) as u64;
                return Ok(Encoded {
                    bytes: tagged(TAG_ZSTD, &compressed),
                    compressed: true,
                    bytes_saved,
                });
            }
        }

        Ok(Encoded {
            bytes: tagged(TAG_RAW, &json),
            compressed: false,
            bytes_saved: 0,
        })
    }

    /// Decode a tagged payload back into `T`
    pub fn decode<T>(&self, key: &str, payload: &[u8]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let json = self.decode_json(key, payload)?;
        serde_json::from_slice(&json).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            operation: SerializationOp::Deserialize,
            source: Box::new(e),
            recovery_hint: RecoveryHint::ClearAndRetry,
        })
    }

    /// Strip the tag and decompress, yielding raw JSON bytes
    pub fn decode_json(&self, key: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let Some((&tag, body)) = payload.split_first() else {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: "empty payload".to_string(),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        };

        match tag {
            TAG_RAW => Ok(body.to_vec()),
            TAG_ZSTD => zstd_decode(body).map_err(|e| CacheError::Compression {
                operation: "decompress",
                source: Box::new(e),
                recovery_hint: RecoveryHint::ClearAndRetry,
            }),
            other => Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!("unknown encoding tag {other:#04x}"),
                recovery_hint: RecoveryHint::ClearAndRetry,
            }),
        }
    }
}

fn tagged(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.push(tag);
    bytes.extend_from_slice(body);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Product {
        id: u64,
        name: String,
        description: String,
    }

    #[test]
    fn test_small_values_stay_raw() {
        let codec = Codec::default();
        let encoded = codec.encode("product:1", &serde_json::json!({"name": "X"})).unwrap();

        assert_eq!(encoded.bytes[0], TAG_RAW);
        assert!(!encoded.compressed);
        assert_eq!(&encoded.bytes[1..], br#"{"name":"X"}"#);
    }

    #[test]
    fn test_large_values_compress_and_round_trip() {
        let codec = Codec::default();
        let product = Product {
            id: 9,
            name: "Hamaca".to_string(),
            description: "tejida a mano ".repeat(200),
        };

        let encoded = codec.encode("product:9", &product).unwrap();
        assert_eq!(encoded.bytes[0], TAG_ZSTD);
        assert!(encoded.compressed);
        assert!(encoded.bytes_saved > 0);

        let decoded: Product = codec.decode("product:9", &encoded.bytes).unwrap();
        assert_eq!(decoded, product);
    }

    #[test]
    fn test_incompressible_payload_kept_raw() {
        let codec = Codec::new(CompressionConfig {
            min_size: 8,
            ..Default::default()
        });
        // short, high-entropy JSON that zstd cannot shrink
        let encoded = codec.encode("k", "aZ3$kQ9!").unwrap();
        assert_eq!(encoded.bytes[0], TAG_RAW);
        assert_eq!(encoded.bytes_saved, 0);
    }

    #[test]
    fn test_empty_payload_is_corruption() {
        let err = Codec::default().decode::<String>("k", &[]).unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(err.error_type(), "corruption");
    }

    #[test]
    fn test_unknown_tag_is_corruption() {
        let err = Codec::default().decode::<String>("k", &[0x07, b'1']).unwrap_err();
        assert!(err.is_corruption());
        assert!(err.to_string().contains("0x07"));
    }

    #[test]
    fn test_garbage_zstd_body_is_corruption() {
        let err = Codec::default()
            .decode::<String>("k", &[TAG_ZSTD, 1, 2, 3])
            .unwrap_err();
        assert!(err.is_corruption());
    }

    proptest! {
        #[test]
        fn prop_round_trip_any_string(s in ".{0,3000}", min_size in 0usize..2048) {
            let codec = Codec::new(CompressionConfig { min_size, ..Default::default() });
            let encoded = codec.encode("k", &s).unwrap();
            prop_assert!(encoded.bytes[0] == TAG_RAW || encoded.bytes[0] == TAG_ZSTD);
            let decoded: String = codec.decode("k", &encoded.bytes).unwrap();
            prop_assert_eq!(decoded, s);
        }

        #[test]
        fn prop_compressed_never_larger(words in proptest::collection::vec("[a-z]{1,8}", 0..400)) {
            let codec = Codec::default();
            let encoded = codec.encode("k", &words).unwrap();
            let raw_len = serde_json::to_vec(&words).unwrap().len() + 1;
            prop_assert!(encoded.bytes.len() <= raw_len);
        }
    }
}
