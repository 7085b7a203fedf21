//! Resilience patterns for calls to volatile dependencies.
//!
//! ## Key Components
//!
//! - **`circuit`**: per-dependency circuit breakers, a registry that owns
//!   them, and retry helpers that cooperate with open circuits.

pub mod circuit;

pub use circuit::{
    retry, retry_with_circuit_breaker, BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig,
    CircuitBreakerRegistry, CircuitBreakerStats, CircuitState, RetryConfig, RetryOn,
};
