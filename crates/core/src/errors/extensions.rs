//! Extension traits and inspection helpers for error handling

use super::types::{Error, Result};

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Other {
            context: message.into(),
            source: Some(Box::new(e.into())),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::Other {
            context: f(),
            source: Some(Box::new(e.into())),
        })
    }
}

impl Error {
    /// Walk the source chain looking for an error of type `T`.
    ///
    /// The error itself is checked first, so `Error` can be matched as well.
    pub fn find_source<T>(&self) -> Option<&T>
    where
        T: std::error::Error + 'static,
    {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(found) = err.downcast_ref::<T>() {
                return Some(found);
            }
            current = err.source();
        }
        None
    }

    /// Strip `Other` wrappers added by `ResultExt::context`.
    #[must_use]
    pub fn peeled(&self) -> &Error {
        let mut current = self;
        while let Error::Other {
            source: Some(inner),
            ..
        } = current
        {
            match inner.downcast_ref::<Error>() {
                Some(wrapped) => current = wrapped,
                None => break,
            }
        }
        current
    }

    /// Whether retrying the same call could plausibly succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        let peeled = self.peeled();
        if !std::ptr::eq(peeled, self) {
            return peeled.is_transient();
        }
        match self {
            Error::Timeout { .. }
            | Error::CircuitOpen { .. }
            | Error::ExternalService { .. }
            | Error::Cache { .. } => true,
            Error::Database { message, .. } => !is_integrity_violation(message),
            Error::FileSystem { source, .. } => is_transient_io(source),
            Error::Other { .. } => self
                .find_source::<std::io::Error>()
                .is_some_and(is_transient_io),
            _ => false,
        }
    }

    /// Stable variant name, used as a metric label
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::Database { .. } => "database",
            Error::ExternalService { .. } => "external_service",
            Error::Payment { .. } => "payment",
            Error::Validation { .. } => "validation",
            Error::Authentication { .. } => "authentication",
            Error::Authorization { .. } => "authorization",
            Error::Security { .. } => "security",
            Error::Performance { .. } => "performance",
            Error::Timeout { .. } => "timeout",
            Error::CircuitOpen { .. } => "circuit_open",
            Error::Cache { .. } => "cache",
            Error::Configuration { .. } => "configuration",
            Error::FileSystem { .. } => "file_system",
            Error::Json { .. } => "json",
            Error::Other { .. } => "other",
        }
    }
}

/// Constraint and integrity violations never succeed on retry
pub(crate) fn is_integrity_violation(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["constraint", "integrity", "duplicate key", "foreign key"]
        .iter()
        .any(|needle| lower.contains(needle))
}

fn is_transient_io(error: &std::io::Error) -> bool {
    use std::io::ErrorKind;
    matches!(
        error.kind(),
        ErrorKind::TimedOut
            | ErrorKind::WouldBlock
            | ErrorKind::Interrupted
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
    )
}
