//! Error taxonomy: what went wrong and how badly

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Broad class of a handled error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    Authorization,
    Payment,
    Database,
    ExternalService,
    Performance,
    Validation,
    Security,
    System,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 9] = [
        ErrorCategory::Authentication,
        ErrorCategory::Authorization,
        ErrorCategory::Payment,
        ErrorCategory::Database,
        ErrorCategory::ExternalService,
        ErrorCategory::Performance,
        ErrorCategory::Validation,
        ErrorCategory::Security,
        ErrorCategory::System,
    ];

    /// Stable label used in logs and metrics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Authorization => "authorization",
            ErrorCategory::Payment => "payment",
            ErrorCategory::Database => "database",
            ErrorCategory::ExternalService => "external_service",
            ErrorCategory::Performance => "performance",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Security => "security",
            ErrorCategory::System => "system",
        }
    }

    /// Category-level recoverability before per-error overrides
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        matches!(
            self,
            ErrorCategory::Database
                | ErrorCategory::ExternalService
                | ErrorCategory::Payment
                | ErrorCategory::Performance
        )
    }

    /// Advisory wait before retrying a recoverable error of this category
    #[must_use]
    pub const fn default_retry_after(self) -> Option<Duration> {
        match self {
            ErrorCategory::Database => Some(Duration::from_secs(30)),
            ErrorCategory::ExternalService => Some(Duration::from_secs(60)),
            ErrorCategory::Payment => Some(Duration::from_secs(120)),
            ErrorCategory::Performance => Some(Duration::from_secs(15)),
            _ => None,
        }
    }

    /// Categories that are always forwarded to the audit trail
    #[must_use]
    pub const fn is_security_relevant(self) -> bool {
        matches!(
            self,
            ErrorCategory::Security | ErrorCategory::Authentication | ErrorCategory::Authorization
        )
    }

    /// Message safe to show to end users
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "Please sign in again to continue.",
            ErrorCategory::Authorization => "You do not have permission to perform this action.",
            ErrorCategory::Payment => {
                "We could not process your payment. Please try again or use another method."
            }
            ErrorCategory::Database => {
                "We are having trouble reaching our data store. Please try again shortly."
            }
            ErrorCategory::ExternalService => {
                "A partner service is temporarily unavailable. Please try again later."
            }
            ErrorCategory::Performance => {
                "The service is under heavy load. Please try again in a moment."
            }
            ErrorCategory::Validation => "Some of the information provided is invalid.",
            ErrorCategory::Security => "This request was blocked for security reasons.",
            ErrorCategory::System => "An unexpected error occurred. Our team has been notified.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgently a handled error needs attention
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorSeverity::Low => "low",
            ErrorSeverity::Medium => "medium",
            ErrorSeverity::High => "high",
            ErrorSeverity::Critical => "critical",
        }
    }

    /// High and critical errors always reach the audit trail
    #[must_use]
    pub const fn requires_audit(self) -> bool {
        matches!(self, ErrorSeverity::High | ErrorSeverity::Critical)
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
