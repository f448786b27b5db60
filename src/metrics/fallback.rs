//! Per-circuit metrics for the fallback path.

use std::time::Instant;

use serde::Serialize;

use crate::config::{ConfigError, RollingConfig};
use crate::metrics::outcome::{classify_fallback, FallbackCounter, FallbackOutcome};
use crate::rolling::{CounterSnapshot, RollingCounter};

/// Fallback counters. Independent of the command bundle of the same circuit.
#[derive(Debug)]
pub struct FallbackMetrics {
    pub successes: RollingCounter,
    pub err_failures: RollingCounter,
    pub err_bad_requests: RollingCounter,
    pub err_interrupts: RollingCounter,
    pub err_concurrency_rejected: RollingCounter,
    rolling: RollingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackSnapshot {
    pub errors: u64,
    pub legitimate_attempts: u64,
    pub successes: CounterSnapshot,
    pub err_failures: CounterSnapshot,
    pub err_bad_requests: CounterSnapshot,
    pub err_interrupts: CounterSnapshot,
    pub err_concurrency_rejected: CounterSnapshot,
}

impl FallbackMetrics {
    pub fn new(rolling: &RollingConfig) -> Result<Self, ConfigError> {
        Self::starting_at(rolling, Instant::now())
    }

    pub fn starting_at(rolling: &RollingConfig, origin: Instant) -> Result<Self, ConfigError> {
        let counter = || RollingCounter::starting_at(rolling, origin);
        Ok(Self {
            successes: counter()?,
            err_failures: counter()?,
            err_bad_requests: counter()?,
            err_interrupts: counter()?,
            err_concurrency_rejected: counter()?,
            rolling: rolling.clone(),
        })
    }

    pub fn rolling_config(&self) -> &RollingConfig {
        &self.rolling
    }

    pub fn counter(&self, which: FallbackCounter) -> &RollingCounter {
        match which {
            FallbackCounter::Successes => &self.successes,
            FallbackCounter::ErrFailures => &self.err_failures,
            FallbackCounter::ErrBadRequests => &self.err_bad_requests,
            FallbackCounter::ErrInterrupts => &self.err_interrupts,
            FallbackCounter::ErrConcurrencyRejected => &self.err_concurrency_rejected,
        }
    }

    pub(crate) fn record(&self, outcome: FallbackOutcome, at: Instant) {
        self.counter(classify_fallback(outcome)).increment_at(at);
    }

    pub fn errors_at(&self, at: Instant) -> u64 {
        self.err_failures.rolling_sum_at(at)
    }

    pub fn legitimate_attempts_at(&self, at: Instant) -> u64 {
        self.successes.rolling_sum_at(at) + self.err_failures.rolling_sum_at(at)
    }

    pub fn snapshot_at(&self, at: Instant) -> FallbackSnapshot {
        FallbackSnapshot {
            errors: self.errors_at(at),
            legitimate_attempts: self.legitimate_attempts_at(at),
            successes: self.successes.snapshot_at(at),
            err_failures: self.err_failures.snapshot_at(at),
            err_bad_requests: self.err_bad_requests.snapshot_at(at),
            err_interrupts: self.err_interrupts.snapshot_at(at),
            err_concurrency_rejected: self.err_concurrency_rejected.snapshot_at(at),
        }
    }
}
