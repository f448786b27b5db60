//! Per-circuit metrics for the primary execution path.

use std::time::Instant;

use serde::Serialize;

use crate::config::{ConfigError, RollingConfig};
use crate::metrics::outcome::{classify, CommandCounter, Outcome};
use crate::rolling::{CounterSnapshot, RollingCounter};

/// One rolling counter per primary-path outcome.
///
/// Errors are real failures only: bad requests, interrupts, timeouts and
/// rejections are tracked but never counted as errors.
#[derive(Debug)]
pub struct CommandMetrics {
    pub successes: RollingCounter,
    pub err_failures: RollingCounter,
    pub err_bad_requests: RollingCounter,
    pub err_interrupts: RollingCounter,
    pub err_timeouts: RollingCounter,
    pub err_concurrency_rejected: RollingCounter,
    pub err_short_circuited: RollingCounter,
    rolling: RollingConfig,
}

/// Serializable view of a command bundle at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSnapshot {
    pub errors: u64,
    pub legitimate_attempts: u64,
    pub successes: CounterSnapshot,
    pub err_failures: CounterSnapshot,
    pub err_bad_requests: CounterSnapshot,
    pub err_interrupts: CounterSnapshot,
    pub err_timeouts: CounterSnapshot,
    pub err_concurrency_rejected: CounterSnapshot,
    pub err_short_circuited: CounterSnapshot,
}

impl CommandMetrics {
    pub fn new(rolling: &RollingConfig) -> Result<Self, ConfigError> {
        Self::starting_at(rolling, Instant::now())
    }

    /// Build every counter with the same window and origin.
    pub fn starting_at(rolling: &RollingConfig, origin: Instant) -> Result<Self, ConfigError> {
        let counter = || RollingCounter::starting_at(rolling, origin);
        Ok(Self {
            successes: counter()?,
            err_failures: counter()?,
            err_bad_requests: counter()?,
            err_interrupts: counter()?,
            err_timeouts: counter()?,
            err_concurrency_rejected: counter()?,
            err_short_circuited: counter()?,
            rolling: rolling.clone(),
        })
    }

    pub fn rolling_config(&self) -> &RollingConfig {
        &self.rolling
    }

    pub fn counter(&self, which: CommandCounter) -> &RollingCounter {
        match which {
            CommandCounter::Successes => &self.successes,
            CommandCounter::ErrFailures => &self.err_failures,
            CommandCounter::ErrBadRequests => &self.err_bad_requests,
            CommandCounter::ErrInterrupts => &self.err_interrupts,
            CommandCounter::ErrTimeouts => &self.err_timeouts,
            CommandCounter::ErrConcurrencyRejected => &self.err_concurrency_rejected,
            CommandCounter::ErrShortCircuited => &self.err_short_circuited,
        }
    }

    pub(crate) fn record(&self, outcome: Outcome, at: Instant) {
        self.counter(classify(outcome)).increment_at(at);
    }

    /// Real errors in the window ending at `at`.
    pub fn errors_at(&self, at: Instant) -> u64 {
        self.err_failures.rolling_sum_at(at)
    }

    /// Successes plus real errors in the window ending at `at`.
    pub fn legitimate_attempts_at(&self, at: Instant) -> u64 {
        self.successes.rolling_sum_at(at) + self.err_failures.rolling_sum_at(at)
    }

    pub fn snapshot_at(&self, at: Instant) -> CommandSnapshot {
        CommandSnapshot {
            errors: self.errors_at(at),
            legitimate_attempts: self.legitimate_attempts_at(at),
            successes: self.successes.snapshot_at(at),
            err_failures: self.err_failures.snapshot_at(at),
            err_bad_requests: self.err_bad_requests.snapshot_at(at),
            err_interrupts: self.err_interrupts.snapshot_at(at),
            err_timeouts: self.err_timeouts.snapshot_at(at),
            err_concurrency_rejected: self.err_concurrency_rejected.snapshot_at(at),
            err_short_circuited: self.err_short_circuited.snapshot_at(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn metrics() -> (CommandMetrics, Instant) {
        let origin = Instant::now();
        let rolling = RollingConfig::new(Duration::from_millis(100), 10);
        (CommandMetrics::starting_at(&rolling, origin).unwrap(), origin)
    }

    #[test]
    fn test_each_outcome_moves_exactly_one_counter() {
        for outcome in Outcome::ALL {
            let (m, t0) = metrics();
            m.record(outcome, t0);

            let target = classify(outcome);
            for which in CommandCounter::ALL {
                let expected = u64::from(which == target);
                assert_eq!(m.counter(which).total_sum(), expected, "{outcome} / {which:?}");
                assert_eq!(m.counter(which).rolling_sum_at(t0), expected, "{outcome} / {which:?}");
            }
        }
    }

    #[test]
    fn test_errors_and_legitimate_attempts() {
        let (m, t0) = metrics();
        m.record(Outcome::Success, t0);
        m.record(Outcome::Success, t0);
        m.record(Outcome::Failure, t0);
        m.record(Outcome::BadRequest, t0);
        m.record(Outcome::Interrupt, t0);
        m.record(Outcome::Timeout, t0);

        assert_eq!(m.errors_at(t0), 1);
        assert_eq!(m.errors_at(t0), m.err_failures.rolling_sum_at(t0));
        assert_eq!(m.legitimate_attempts_at(t0), 3);
    }

    #[test]
    fn test_errors_leave_the_window() {
        let (m, t0) = metrics();
        m.record(Outcome::Failure, t0);

        let later = t0 + Duration::from_millis(1_500);
        assert_eq!(m.errors_at(later), 0);
        assert_eq!(m.legitimate_attempts_at(later), 0);
        assert_eq!(m.err_failures.total_sum(), 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let (m, t0) = metrics();
        m.record(Outcome::Failure, t0);
        m.record(Outcome::Interrupt, t0);

        let snap = m.snapshot_at(t0);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.err_interrupts, CounterSnapshot { rolling: 1, total: 1 });

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["errors"], 1);
        assert_eq!(json["err_interrupts"]["total"], 1);
    }

    #[test]
    fn test_invalid_window_is_rejected() {
        let rolling = RollingConfig::new(Duration::from_millis(100), 0);
        assert!(CommandMetrics::new(&rolling).is_err());
    }
}
