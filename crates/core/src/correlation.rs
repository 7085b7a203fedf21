//! Request correlation contexts
//!
//! A correlation context ties together everything that happened while
//! serving one request: monitored operations, cache lookups, handled errors.
//! Contexts live in a sharded map and are swept once they exceed the
//! configured maximum age.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// One entry in a correlation timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationEvent {
    pub kind: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// Ordered event history for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationContext {
    pub correlation_id: String,
    pub started_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub endpoint: Option<String>,
    pub ip_address: Option<String>,
    pub events: Vec<CorrelationEvent>,
}

struct Tracked {
    context: CorrelationContext,
    created: Instant,
}

/// Concurrent registry of live correlation contexts
pub struct CorrelationRegistry {
    contexts: DashMap<String, Tracked>,
    max_age: Duration,
}

impl CorrelationRegistry {
    pub fn new(max_age: Duration) -> Self {
        Self {
            contexts: DashMap::new(),
            max_age,
        }
    }

    /// Start a context with a fresh UUID and return its id
    pub fn begin(
        &self,
        user_id: Option<String>,
        endpoint: Option<String>,
        ip_address: Option<String>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.begin_with_id(id.clone(), user_id, endpoint, ip_address);
        id
    }

    /// Start a context under a caller-supplied id, e.g. an inbound request header.
    ///
    /// An existing context with the same id is replaced.
    pub fn begin_with_id(
        &self,
        correlation_id: String,
        user_id: Option<String>,
        endpoint: Option<String>,
        ip_address: Option<String>,
    ) {
        let context = CorrelationContext {
            correlation_id: correlation_id.clone(),
            started_at: Utc::now(),
            user_id,
            endpoint,
            ip_address,
            events: Vec::new(),
        };
        self.contexts.insert(
            correlation_id,
            Tracked {
                context,
                created: Instant::now(),
            },
        );
    }

    /// Append an event; returns `false` if the context is unknown or swept
    pub fn record_event(
        &self,
        correlation_id: &str,
        kind: impl Into<String>,
        message: impl Into<String>,
        metadata: HashMap<String, String>,
    ) -> bool {
        match self.contexts.get_mut(correlation_id) {
            Some(mut tracked) => {
                tracked.context.events.push(CorrelationEvent {
                    kind: kind.into(),
                    message: message.into(),
                    timestamp: Utc::now(),
                    metadata,
                });
                true
            }
            None => false,
        }
    }

    pub fn get(&self, correlation_id: &str) -> Option<CorrelationContext> {
        self.contexts
            .get(correlation_id)
            .map(|tracked| tracked.context.clone())
    }

    /// Remove a finished context and hand it back
    pub fn end(&self, correlation_id: &str) -> Option<CorrelationContext> {
        self.contexts
            .remove(correlation_id)
            .map(|(_, tracked)| tracked.context)
    }

    /// Drop contexts older than the maximum age, returning how many went
    pub fn sweep(&self) -> usize {
        let before = self.contexts.len();
        let max_age = self.max_age;
        self.contexts
            .retain(|_, tracked| tracked.created.elapsed() < max_age);
        let removed = before.saturating_sub(self.contexts.len());
        if removed > 0 {
            debug!(removed, remaining = self.contexts.len(), "Swept correlation contexts");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
