//! Audit sinks: where audit events end up

use super::event::AuditEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::info;

/// Receives audit events from the dispatcher worker
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        event: &AuditEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Sink name for diagnostics
    fn name(&self) -> &'static str;
}

/// Emits audit events as structured logs on the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(
        &self,
        event: &AuditEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            target: "audit",
            event_type = %event.event_type,
            severity = %event.severity,
            user_id = event.user_id.as_deref().unwrap_or("-"),
            ip_address = event.ip_address.as_deref().unwrap_or("-"),
            correlation_id = event.correlation_id.as_deref().unwrap_or("-"),
            details = %event.details,
            "audit event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}

/// Appends one JSON document per line to a file
pub struct JsonlAuditSink {
    path: PathBuf,
    writer: tokio::sync::Mutex<BufWriter<File>>,
}

impl JsonlAuditSink {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            writer: tokio::sync::Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(
        &self,
        event: &AuditEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

/// Keeps events in memory; used by tests and the CLI report
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(
        &self,
        event: &AuditEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
