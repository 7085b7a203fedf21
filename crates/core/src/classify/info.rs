//! Handled-error records and their public projection

use super::category::{ErrorCategory, ErrorSeverity};
use super::rules::ErrorClassifier;
use crate::errors::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Request details attached to a handled error
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub correlation_id: Option<String>,
    pub user_id: Option<String>,
    pub endpoint: Option<String>,
    pub ip_address: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }
}

/// Immutable record of one handled error.
///
/// `technical_message` is for logs only; use [`ErrorInfo::to_response`] for
/// anything returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub error_id: Uuid,
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub recoverable: bool,
    pub retry_after: Option<Duration>,
    pub user_message: String,
    pub technical_message: String,
    pub context: ErrorContext,
    pub timestamp: DateTime<Utc>,
}

impl ErrorInfo {
    /// Classify `error` and build the record
    pub fn from_error(classifier: &ErrorClassifier, error: &Error, context: ErrorContext) -> Self {
        let classification = classifier.classify(error);
        let recoverable = classifier.is_recoverable(error, classification.category);
        let retry_after = classifier.retry_after(error, classification.category);

        Self {
            error_id: Uuid::new_v4(),
            category: classification.category,
            severity: classification.severity,
            recoverable,
            retry_after,
            user_message: classification.category.user_message().to_string(),
            technical_message: technical_message(error),
            context,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error_id: self.error_id.to_string(),
            category: self.category,
            recoverable: self.recoverable,
            retry_after_seconds: self.retry_after.map(|d| d.as_secs()),
            message: self.user_message.clone(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error {}: {}",
            self.category, self.error_id, self.user_message
        )
    }
}

impl std::error::Error for ErrorInfo {}

/// What callers outside the service are allowed to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_id: String,
    pub category: ErrorCategory,
    pub recoverable: bool,
    pub retry_after_seconds: Option<u64>,
    pub message: String,
}

/// Full display chain, `outer: inner: ...`
fn technical_message(error: &Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
