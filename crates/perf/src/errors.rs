//! Unified error handling
//!
//! Every handled error is classified into an [`ErrorInfo`], logged, counted
//! per category and, when security-relevant or severe, forwarded to the
//! audit trail.

use crate::context::PerformanceContext;
use crate::scope::tags;
use mercado_core::audit::AuditEvent;
use mercado_core::{Error, ErrorCategory, ErrorContext, ErrorInfo, ErrorSeverity, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use tracing::{error, warn, Instrument};

/// Handled error totals and the most recent records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub total: u64,
    pub by_category: BTreeMap<ErrorCategory, u64>,
    pub by_severity: BTreeMap<ErrorSeverity, u64>,
    /// Newest first
    pub recent: Vec<ErrorInfo>,
}

pub(crate) struct ErrorLog {
    capacity: usize,
    state: Mutex<ErrorLogState>,
}

#[derive(Default)]
struct ErrorLogState {
    total: u64,
    by_category: BTreeMap<ErrorCategory, u64>,
    by_severity: BTreeMap<ErrorSeverity, u64>,
    recent: VecDeque<ErrorInfo>,
}

impl ErrorLog {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(ErrorLogState::default()),
        }
    }

    pub(crate) fn record(&self, info: &ErrorInfo) {
        let mut state = self.state.lock();
        state.total += 1;
        *state.by_category.entry(info.category).or_insert(0) += 1;
        *state.by_severity.entry(info.severity).or_insert(0) += 1;
        if self.capacity > 0 {
            state.recent.push_back(info.clone());
            while state.recent.len() > self.capacity {
                state.recent.pop_front();
            }
        }
    }

    pub(crate) fn stats(&self) -> ErrorStats {
        let state = self.state.lock();
        ErrorStats {
            total: state.total,
            by_category: state.by_category.clone(),
            by_severity: state.by_severity.clone(),
            recent: state.recent.iter().rev().cloned().collect(),
        }
    }
}

impl PerformanceContext {
    /// Classify, log, count and possibly audit an error.
    ///
    /// The returned record is safe to hand to callers through
    /// [`ErrorInfo::to_response`].
    pub fn handle_error(&self, err: &Error, context: ErrorContext) -> ErrorInfo {
        let inner = &self.inner;
        let info = ErrorInfo::from_error(&inner.classifier, err, context);

        if info.severity >= ErrorSeverity::High {
            error!(
                error_id = %info.error_id,
                category = %info.category,
                severity = %info.severity,
                recoverable = info.recoverable,
                correlation_id = info.context.correlation_id.as_deref().unwrap_or(""),
                technical = %info.technical_message,
                "Handled error"
            );
        } else {
            warn!(
                error_id = %info.error_id,
                category = %info.category,
                severity = %info.severity,
                recoverable = info.recoverable,
                correlation_id = info.context.correlation_id.as_deref().unwrap_or(""),
                technical = %info.technical_message,
                "Handled error"
            );
        }

        inner.errors.record(&info);
        inner
            .exporter
            .record_error(info.category.as_str(), info.severity.as_str());

        if info.category.is_security_relevant() || info.severity.requires_audit() {
            inner.audit.submit(AuditEvent::from_error_info(&info));
        }

        if let Some(id) = info.context.correlation_id.as_deref() {
            inner.correlations.record_event(
                id,
                "error",
                format!("{} error {}", info.category, info.error_id),
                HashMap::from([
                    ("error_id".to_string(), info.error_id.to_string()),
                    ("severity".to_string(), info.severity.to_string()),
                ]),
            );
        }

        info
    }

    /// Call an external dependency through its circuit breaker.
    ///
    /// Failures, including rejections by an open breaker, come back as a
    /// handled [`ErrorInfo`] carrying the retry hint.
    pub async fn call_external<T, F, Fut>(
        &self,
        service: &str,
        context: ErrorContext,
        operation: F,
    ) -> std::result::Result<T, ErrorInfo>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut scope = self.monitor_operation(
            &format!("external:{service}"),
            tags([("service", service)]),
        );
        if let Some(id) = context.correlation_id.as_deref() {
            scope = scope.with_correlation(id);
        }

        let span = scope.span().clone();
        match self.inner.breakers.call(service, operation).instrument(span).await {
            Ok(value) => {
                scope.complete();
                Ok(value)
            }
            Err(e) => {
                scope.fail(&e);
                Err(self.handle_error(&e, context))
            }
        }
    }

    pub fn error_stats(&self) -> ErrorStats {
        self.inner.errors.stats()
    }
}
