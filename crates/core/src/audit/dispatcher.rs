//! Bounded, non-blocking delivery of audit events to a sink

use super::event::AuditEvent;
use super::sink::AuditSink;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time audit delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub accepted: u64,
    pub delivered: u64,
    pub failed: u64,
    /// Events discarded because the queue was full or closed
    pub audit_dropped: u64,
}

/// Queues audit events for a background worker.
///
/// `submit` never waits: when the queue is full the event is dropped and
/// counted. Must be created from within a Tokio runtime.
pub struct AuditDispatcher {
    sender: Mutex<Option<mpsc::Sender<AuditEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
    sink_name: &'static str,
}

impl AuditDispatcher {
    pub fn new(sink: Arc<dyn AuditSink>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<AuditEvent>(capacity.max(1));
        let counters = Arc::new(Counters::default());
        let sink_name = sink.name();

        let worker_counters = Arc::clone(&counters);
        let worker = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match sink.record(&event).await {
                    Ok(()) => {
                        worker_counters.delivered.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            sink = sink.name(),
                            event_type = %event.event_type,
                            error = %e,
                            "Audit sink failed to record event"
                        );
                    }
                }
            }
            debug!(sink = sink.name(), "Audit worker stopped");
        });

        Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            counters,
            sink_name,
        }
    }

    /// Enqueue an event; returns `false` if it was dropped
    pub fn submit(&self, event: AuditEvent) -> bool {
        let guard = self.sender.lock();
        let Some(sender) = guard.as_ref() else {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            debug!(event_type = %event.event_type, "Audit dispatcher closed, event dropped");
            return false;
        };

        match sender.try_send(event) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(event)) => {
                let dropped = self.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    sink = self.sink_name,
                    event_type = %event.event_type,
                    audit_dropped = dropped,
                    "Audit queue full, event dropped"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(event_type = %event.event_type, "Audit worker gone, event dropped");
                false
            }
        }
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            audit_dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting events and wait for the queue to drain
    pub async fn close(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "Audit worker terminated abnormally");
            }
        }
    }
}

impl Drop for AuditDispatcher {
    fn drop(&mut self) {
        // Dropping the sender lets the worker finish whatever is queued
        self.sender.get_mut().take();
    }
}
