//! Builder methods for creating errors with context

use super::types::{BoxError, Error};
use std::path::PathBuf;
use std::time::Duration;

impl Error {
    /// Create a database error
    #[must_use]
    pub fn database(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Database {
            operation: operation.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a database error wrapping the driver error
    #[must_use]
    pub fn database_with_source(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Error::Database {
            operation: operation.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create an external service error
    #[must_use]
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ExternalService {
            service: service.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an external service error wrapping the transport error
    #[must_use]
    pub fn external_service_with_source(
        service: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Error::ExternalService {
            service: service.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a payment error
    #[must_use]
    pub fn payment(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Payment {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Create an authorization error
    #[must_use]
    pub fn authorization(action: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Authorization {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Create a security violation error
    #[must_use]
    pub fn security(message: impl Into<String>) -> Self {
        Error::Security {
            message: message.into(),
        }
    }

    /// Create a performance degradation error
    #[must_use]
    pub fn performance(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Performance {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a circuit-open rejection
    #[must_use]
    pub fn circuit_open(service: impl Into<String>, retry_after: Duration) -> Self {
        Error::CircuitOpen {
            service: service.into(),
            retry_after,
        }
    }

    /// Create a cache error
    #[must_use]
    pub fn cache(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Cache {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create an uncategorised error
    #[must_use]
    pub fn other(context: impl Into<String>) -> Self {
        Error::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Wrap a foreign error so classification can inspect it
    #[must_use]
    pub fn wrap(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Other {
            context: context.into(),
            source: Some(source.into()),
        }
    }
}
