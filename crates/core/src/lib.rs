//! Core types for the mercado performance layer.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum raised by business code and the layer
//!   itself, with builder constructors and the `Result` alias.
//! - **`classify`**: error taxonomy, ordered classification rules, recovery
//!   policy and the `ErrorInfo`/`ErrorResponse` records.
//! - **`correlation`**: per-request event timelines.
//! - **`audit`**: the audit collaborator and its bounded dispatcher.
//! - **`config`**: `PerformanceConfig`, SLA thresholds and the TTL policy.

pub mod audit;
pub mod classify;
pub mod config;
pub mod constants;
pub mod correlation;
pub mod errors;

pub use self::{
    classify::{ErrorCategory, ErrorClassifier, ErrorContext, ErrorInfo, ErrorResponse, ErrorSeverity},
    config::{PerformanceConfig, SlaThresholds},
    constants::*,
    correlation::{CorrelationContext, CorrelationRegistry},
    errors::{BoxError, Error, Result, ResultExt},
};
