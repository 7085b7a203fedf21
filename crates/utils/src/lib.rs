//! Shared utilities for the mercado performance layer
//!
//! Resilience primitives (circuit breakers, retries) and logging setup used
//! by every other crate in the workspace.

pub mod resilience;
pub mod tracing;

pub use resilience::*;
pub use tracing::{init_tracing, operation_span};
