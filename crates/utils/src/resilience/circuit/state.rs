//! A circuit breaker guarding one named dependency.

use super::config::CircuitBreakerConfig;
use super::machine::{Admission, Machine};
use super::types::{CircuitBreakerStats, CircuitState};
use mercado_core::{Error, Result};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub struct CircuitBreaker {
    name: Arc<str>,
    config: CircuitBreakerConfig,
    machine: Mutex<Machine>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<Arc<str>>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            machine: Mutex::new(Machine::new(Instant::now())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An open circuit whose cooldown has elapsed reports
    /// (and becomes) half-open.
    pub fn state(&self) -> CircuitState {
        self.machine
            .lock()
            .observe(Instant::now(), &self.config, &self.name)
    }

    /// Execute an operation through the circuit breaker.
    ///
    /// An open circuit rejects with [`Error::CircuitOpen`] without running
    /// `operation`; the error carries the remaining cooldown.
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let admission = self
            .machine
            .lock()
            .admit(Instant::now(), &self.config, &self.name);
        let generation = match admission {
            Admission::Run { generation } => generation,
            Admission::Reject { retry_after } => {
                return Err(Error::circuit_open(self.name.as_ref(), retry_after));
            }
        };

        let pending = PendingCall {
            breaker: self,
            generation,
            settled: false,
        };
        let result = operation().await;
        pending.settle(result.is_ok());
        result
    }

    /// Time until an open circuit allows a trial call; zero otherwise
    pub fn retry_after(&self) -> Duration {
        self.machine.lock().cooldown(Instant::now(), &self.config)
    }

    /// Force the circuit closed and clear all counters
    pub fn reset(&self) {
        self.machine
            .lock()
            .close(Instant::now(), &self.config, &self.name);
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        self.machine.lock().stats()
    }
}

/// An admitted call whose outcome is not known yet.
///
/// Dropping it unsettled (the caller's future was cancelled, or the
/// operation panicked) hands a half-open trial slot back.
struct PendingCall<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl PendingCall<'_> {
    fn settle(mut self, succeeded: bool) {
        self.settled = true;
        let breaker = self.breaker;
        let mut machine = breaker.machine.lock();
        let now = Instant::now();
        if succeeded {
            machine.on_success(self.generation, now, &breaker.config, &breaker.name);
        } else {
            machine.on_failure(self.generation, now, &breaker.config, &breaker.name);
        }
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        log::debug!(
            "Call through circuit breaker '{}' ended without an outcome",
            self.breaker.name
        );
        self.breaker.machine.lock().abandon(self.generation);
    }
}
