//! Audit trail collaborator
//!
//! Security-relevant and high-severity errors are handed to an [`AuditSink`]
//! through a bounded queue so that a slow sink can never stall a request.

mod dispatcher;
mod event;
mod sink;

pub use dispatcher::{AuditDispatcher, AuditStats};
pub use event::AuditEvent;
pub use sink::{AuditSink, JsonlAuditSink, MemoryAuditSink, TracingAuditSink};
