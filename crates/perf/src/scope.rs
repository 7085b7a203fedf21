//! Monitored operation scopes

use crate::context::ContextInner;
use mercado_core::{Error, TAG_STATUS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Span;

/// Tags attached to a monitored operation
pub type Tags = BTreeMap<String, String>;

/// Build [`Tags`] from string pairs
pub fn tags<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Tags
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// How a monitored operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Ok,
    Error,
    /// Dropped before completing, e.g. a timed-out or aborted future
    Cancelled,
}

impl OperationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Times one operation and records it when finished.
///
/// Call [`complete`](Self::complete) or [`fail`](Self::fail). A scope that
/// is dropped without either records status `cancelled`, so no sample is
/// lost on early returns or cancelled futures.
#[must_use = "a scope records when it is completed or dropped"]
pub struct OperationScope {
    inner: Arc<ContextInner>,
    name: String,
    tags: Tags,
    correlation_id: Option<String>,
    started: Instant,
    span: Span,
    finished: bool,
}

impl OperationScope {
    pub(crate) fn new(inner: Arc<ContextInner>, name: &str, tags: Tags) -> Self {
        let span = mercado_utils::operation_span(name, None);
        Self {
            inner,
            name: name.to_string(),
            tags,
            correlation_id: None,
            started: Instant::now(),
            span,
            finished: false,
        }
    }

    /// Attach the operation to a request timeline
    pub fn with_correlation(mut self, correlation_id: impl Into<String>) -> Self {
        let id = correlation_id.into();
        self.span.record("correlation_id", id.as_str());
        self.correlation_id = Some(id);
        self
    }

    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Record a successful finish and return the measured duration
    pub fn complete(mut self) -> Duration {
        self.finish(OperationStatus::Ok)
    }

    /// Record a failed finish
    pub fn fail(mut self, error: &Error) -> Duration {
        self.tags
            .insert("error".to_string(), error.peeled().kind_name().to_string());
        self.finish(OperationStatus::Error)
    }

    fn finish(&mut self, status: OperationStatus) -> Duration {
        self.finished = true;
        let elapsed = self.started.elapsed();

        let mut tags = std::mem::take(&mut self.tags);
        tags.insert(TAG_STATUS.to_string(), status.as_str().to_string());

        let _entered = self.span.enter();
        self.inner.record_operation(
            &self.name,
            elapsed,
            status,
            tags,
            self.correlation_id.as_deref(),
        );
        elapsed
    }
}

impl Drop for OperationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(OperationStatus::Cancelled);
        }
    }
}

impl fmt::Debug for OperationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationScope")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("correlation_id", &self.correlation_id)
            .field("elapsed", &self.started.elapsed())
            .finish()
    }
}
