//! Audit event payloads

use crate::classify::{ErrorInfo, ErrorSeverity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A security or high-severity occurrence forwarded to the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: String,
    pub severity: ErrorSeverity,
    pub user_id: Option<String>,
    pub ip_address: Option<String>,
    pub correlation_id: Option<String>,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_type: impl Into<String>, severity: ErrorSeverity) -> Self {
        Self {
            event_type: event_type.into(),
            severity,
            user_id: None,
            ip_address: None,
            correlation_id: None,
            details: serde_json::Value::Null,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Audit record for a handled error. The technical message stays in the
    /// details since the audit trail is internal.
    pub fn from_error_info(info: &ErrorInfo) -> Self {
        Self {
            event_type: format!("error.{}", info.category),
            severity: info.severity,
            user_id: info.context.user_id.clone(),
            ip_address: info.context.ip_address.clone(),
            correlation_id: info.context.correlation_id.clone(),
            details: serde_json::json!({
                "error_id": info.error_id.to_string(),
                "category": info.category,
                "recoverable": info.recoverable,
                "endpoint": info.context.endpoint,
                "technical_message": info.technical_message,
            }),
            timestamp: info.timestamp,
        }
    }
}
