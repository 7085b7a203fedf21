//! The breaker state machine.
//!
//! All transitions take the current instant explicitly, so the machine is
//! a plain struct behind one lock and never awaits while held.

use super::config::CircuitBreakerConfig;
use super::types::{CircuitBreakerStats, CircuitState};
use std::time::Duration;
use tokio::time::Instant;

/// Retry hint handed out when every half-open trial slot is taken
pub(super) const HALF_OPEN_BUSY_RETRY: Duration = Duration::from_secs(1);

/// Whether a call may run, and under which generation its outcome counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Admission {
    Run { generation: u64 },
    Reject { retry_after: Duration },
}

#[derive(Debug)]
pub(super) struct Machine {
    state: CircuitState,
    failures: usize,
    successes: usize,
    trials: usize,
    last_failure: Option<Instant>,
    changed_at: Instant,
    /// Bumped on every transition; outcomes from older generations are dropped
    generation: u64,
}

impl Machine {
    pub(super) fn new(now: Instant) -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            successes: 0,
            trials: 0,
            last_failure: None,
            changed_at: now,
            generation: 0,
        }
    }

    /// Current state, moving Open to HalfOpen once the cooldown has passed
    pub(super) fn observe(&mut self, now: Instant, config: &CircuitBreakerConfig, name: &str) -> CircuitState {
        if self.state == CircuitState::Open && self.cooldown(now, config).is_zero() {
            self.enter(CircuitState::HalfOpen, now, name, config);
        }
        self.state
    }

    /// Time left before an open circuit admits a trial; zero otherwise
    pub(super) fn cooldown(&self, now: Instant, config: &CircuitBreakerConfig) -> Duration {
        match (self.state, self.last_failure) {
            (CircuitState::Open, Some(last)) => {
                config.reset_timeout.saturating_sub(now.saturating_duration_since(last))
            }
            _ => Duration::ZERO,
        }
    }

    pub(super) fn admit(&mut self, now: Instant, config: &CircuitBreakerConfig, name: &str) -> Admission {
        match self.observe(now, config, name) {
            CircuitState::Closed => Admission::Run {
                generation: self.generation,
            },
            CircuitState::Open => Admission::Reject {
                retry_after: self.cooldown(now, config),
            },
            CircuitState::HalfOpen if self.trials < config.half_open_max_calls => {
                self.trials += 1;
                Admission::Run {
                    generation: self.generation,
                }
            }
            CircuitState::HalfOpen => Admission::Reject {
                retry_after: HALF_OPEN_BUSY_RETRY,
            },
        }
    }

    pub(super) fn on_success(&mut self, generation: u64, now: Instant, config: &CircuitBreakerConfig, name: &str) {
        if generation != self.generation {
            return;
        }
        match self.state {
            CircuitState::Closed => self.failures = 0,
            CircuitState::HalfOpen => {
                self.successes += 1;
                if self.successes >= config.success_threshold {
                    self.enter(CircuitState::Closed, now, name, config);
                }
            }
            CircuitState::Open => {}
        }
    }

    pub(super) fn on_failure(&mut self, generation: u64, now: Instant, config: &CircuitBreakerConfig, name: &str) {
        if generation != self.generation {
            return;
        }
        let stale = self
            .last_failure
            .is_some_and(|last| now.saturating_duration_since(last) > config.failure_window);
        if stale {
            self.failures = 0;
        }
        self.last_failure = Some(now);

        match self.state {
            CircuitState::Closed => {
                self.failures += 1;
                if self.failures >= config.failure_threshold {
                    self.enter(CircuitState::Open, now, name, config);
                }
            }
            // a failed trial reopens immediately
            CircuitState::HalfOpen => self.enter(CircuitState::Open, now, name, config),
            CircuitState::Open => {}
        }
    }

    /// An admitted call ended without an outcome (dropped or panicked).
    /// A half-open trial gives its slot back so later calls can decide.
    pub(super) fn abandon(&mut self, generation: u64) {
        if generation == self.generation && self.state == CircuitState::HalfOpen {
            self.trials = self.trials.saturating_sub(1);
        }
    }

    /// Force Closed and forget the failure history
    pub(super) fn close(&mut self, now: Instant, config: &CircuitBreakerConfig, name: &str) {
        self.enter(CircuitState::Closed, now, name, config);
        self.last_failure = None;
    }

    pub(super) fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: self.state,
            failure_count: self.failures,
            success_count: self.successes,
            half_open_calls: self.trials,
            last_failure_time: self.last_failure,
            last_state_change: self.changed_at,
        }
    }

    fn enter(&mut self, next: CircuitState, now: Instant, name: &str, config: &CircuitBreakerConfig) {
        if self.state != next {
            match next {
                CircuitState::Open => log::warn!(
                    "Circuit breaker '{name}' opened after {} failures, rejecting calls for {:?}",
                    self.failures.max(1),
                    config.reset_timeout
                ),
                CircuitState::HalfOpen => log::info!("Circuit breaker '{name}' admitting trial calls"),
                CircuitState::Closed => log::info!("Circuit breaker '{name}' closed"),
            }
            self.state = next;
            self.changed_at = now;
            self.generation += 1;
        }
        self.failures = 0;
        self.successes = 0;
        self.trials = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 1,
            reset_timeout: Duration::from_secs(30),
            half_open_max_calls: 1,
            ..Default::default()
        }
    }

    fn run(admission: Admission) -> u64 {
        match admission {
            Admission::Run { generation } => generation,
            Admission::Reject { retry_after } => panic!("rejected, retry after {retry_after:?}"),
        }
    }

    #[test]
    fn test_outcomes_from_old_generation_are_ignored() {
        let config = config();
        let t0 = Instant::now();
        let mut machine = Machine::new(t0);

        let slow_call = run(machine.admit(t0, &config, "search"));
        for _ in 0..2 {
            let g = run(machine.admit(t0, &config, "search"));
            machine.on_failure(g, t0, &config, "search");
        }
        assert_eq!(machine.stats().state, CircuitState::Open);

        // a call admitted before the circuit opened finishes late
        machine.on_success(slow_call, t0, &config, "search");
        assert_eq!(machine.stats().state, CircuitState::Open);
    }

    #[test]
    fn test_half_open_limits_trials() {
        let config = config();
        let t0 = Instant::now();
        let mut machine = Machine::new(t0);
        for _ in 0..2 {
            let g = run(machine.admit(t0, &config, "search"));
            machine.on_failure(g, t0, &config, "search");
        }

        let later = t0 + Duration::from_secs(31);
        let trial = run(machine.admit(later, &config, "search"));
        assert_eq!(
            machine.admit(later, &config, "search"),
            Admission::Reject {
                retry_after: HALF_OPEN_BUSY_RETRY
            }
        );

        machine.on_success(trial, later, &config, "search");
        assert_eq!(machine.stats().state, CircuitState::Closed);
        assert_eq!(machine.stats().last_state_change, later);
    }

    #[test]
    fn test_abandoned_trial_frees_its_slot() {
        let config = config();
        let t0 = Instant::now();
        let mut machine = Machine::new(t0);
        for _ in 0..2 {
            let g = run(machine.admit(t0, &config, "search"));
            machine.on_failure(g, t0, &config, "search");
        }

        let later = t0 + Duration::from_secs(31);
        let trial = run(machine.admit(later, &config, "search"));
        machine.abandon(trial);
        assert_eq!(machine.stats().half_open_calls, 0);

        let retried = run(machine.admit(later, &config, "search"));
        machine.on_success(retried, later, &config, "search");
        assert_eq!(machine.stats().state, CircuitState::Closed);

        // a stale abandon must not touch the new generation
        machine.abandon(trial);
        assert_eq!(machine.stats().half_open_calls, 0);
    }

    #[test]
    fn test_cooldown_counts_from_last_failure() {
        let config = config();
        let t0 = Instant::now();
        let mut machine = Machine::new(t0);
        for _ in 0..2 {
            let g = run(machine.admit(t0, &config, "search"));
            machine.on_failure(g, t0, &config, "search");
        }
        assert_eq!(
            machine.cooldown(t0 + Duration::from_secs(12), &config),
            Duration::from_secs(18)
        );
    }
}
