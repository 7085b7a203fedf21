//! Circuit breakers, the breaker registry and retry helpers
//!
//! ## Architecture
//!
//! - [`types`] - Core types and enums (CircuitState, RetryOn, etc.)
//! - [`config`] - Configuration structs for retry and circuit breaker behavior
//! - `machine` - The Closed/Open/HalfOpen state machine, driven by timestamps
//! - [`state`] - The breaker handle that admits, runs and records calls
//! - [`registry`] - One breaker per dependency name
//! - [`retry`] - Retry with exponential backoff and jitter
//!
//! ## Examples
//!
//! ```rust,no_run
//! use mercado_utils::resilience::circuit::{CircuitBreakerRegistry, CircuitBreakerConfig};
//!
//! # async fn example() -> mercado_core::Result<String> {
//! let registry = CircuitBreakerRegistry::new(CircuitBreakerConfig::default());
//!
//! let quote = registry.call("shipping", || async {
//!     // call the shipping provider here
//!     Ok("4.99".to_string())
//! }).await;
//! quote
//! # }
//! ```

pub mod config;
mod machine;
pub mod registry;
pub mod retry;
pub mod state;
pub mod types;

// Re-export public API
pub use config::{CircuitBreakerConfig, RetryConfig};
pub use registry::{BreakerSnapshot, CircuitBreakerRegistry};
pub use retry::{retry, retry_with_circuit_breaker};
pub use state::CircuitBreaker;
pub use types::{CircuitBreakerStats, CircuitState, RetryOn};
