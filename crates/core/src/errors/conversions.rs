//! `?` support for the foreign errors the layer runs into most

use super::types::Error;
use std::path::PathBuf;

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        let message = source.to_string();
        Error::Json { message, source }
    }
}

/// Bare I/O failures carry no path; prefer [`Error::file_system`] when one
/// is known.
impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "io".to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_keeps_position() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{ oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_io_error_becomes_file_system() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        match err {
            Error::FileSystem { operation, .. } => assert_eq!(operation, "io"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
