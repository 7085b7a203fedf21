//! Breaker states, retry predicates and statistics

use mercado_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls run and failures are counted
    Closed,
    /// Calls are rejected until the cooldown since the last failure elapses
    Open,
    /// A limited number of trial calls decide between Closed and Open
    HalfOpen,
}

impl CircuitState {
    pub const fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which failures a retry loop may repeat
#[derive(Clone)]
pub enum RetryOn {
    All,
    /// External service failures and timeouts
    ExternalService,
    /// Whatever [`Error::is_transient`] accepts
    Transient,
    Custom(Arc<dyn Fn(&Error) -> bool + Send + Sync>),
}

impl fmt::Debug for RetryOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetryOn::All => "All",
            RetryOn::ExternalService => "ExternalService",
            RetryOn::Transient => "Transient",
            RetryOn::Custom(_) => "Custom",
        };
        write!(f, "RetryOn::{name}")
    }
}

/// Point-in-time counters of one breaker
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    /// Failures counted toward opening while closed
    pub failure_count: usize,
    /// Successful trials while half-open
    pub success_count: usize,
    /// Trials admitted in the current half-open period
    pub half_open_calls: usize,
    pub last_failure_time: Option<Instant>,
    pub last_state_change: Instant,
}
