//! Outcome events and the classifier that maps them onto counters.
//!
//! Classification is a total, one-to-one table: every outcome names exactly
//! one counter. Bad requests and interrupts never map to `Successes` or
//! `ErrFailures`, so they stay out of error and attempt accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal outcome of one primary execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Operation completed without error.
    Success,
    /// Operation returned a real error.
    Failure,
    /// Caller classified the request itself as invalid.
    BadRequest,
    /// Cancelled by an ancestor deadline, not the circuit's own timeout.
    Interrupt,
    /// The circuit's own execution timeout fired.
    Timeout,
    /// Rejected by the concurrency limit before running.
    ConcurrencyRejected,
    /// Rejected because the circuit was open.
    ShortCircuited,
}

impl Outcome {
    pub const ALL: [Outcome; 7] = [
        Outcome::Success,
        Outcome::Failure,
        Outcome::BadRequest,
        Outcome::Interrupt,
        Outcome::Timeout,
        Outcome::ConcurrencyRejected,
        Outcome::ShortCircuited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::BadRequest => "bad_request",
            Outcome::Interrupt => "interrupt",
            Outcome::Timeout => "timeout",
            Outcome::ConcurrencyRejected => "concurrency_rejected",
            Outcome::ShortCircuited => "short_circuited",
        }
    }

    /// Counts toward legitimate attempts (a real pass or fail).
    pub fn is_legitimate(&self) -> bool {
        matches!(self, Outcome::Success | Outcome::Failure)
    }

    /// Ran to completion but says nothing about the operation's health.
    pub fn is_excluded(&self) -> bool {
        matches!(self, Outcome::BadRequest | Outcome::Interrupt)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal outcome of one fallback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FallbackOutcome {
    Success,
    Failure,
    /// The fallback itself reported the request as invalid.
    BadRequest,
    /// The caller's deadline or cancel fired while the fallback ran.
    Interrupt,
    ConcurrencyRejected,
}

impl FallbackOutcome {
    pub const ALL: [FallbackOutcome; 5] = [
        FallbackOutcome::Success,
        FallbackOutcome::Failure,
        FallbackOutcome::BadRequest,
        FallbackOutcome::Interrupt,
        FallbackOutcome::ConcurrencyRejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackOutcome::Success => "success",
            FallbackOutcome::Failure => "failure",
            FallbackOutcome::BadRequest => "bad_request",
            FallbackOutcome::Interrupt => "interrupt",
            FallbackOutcome::ConcurrencyRejected => "concurrency_rejected",
        }
    }

    pub fn is_legitimate(&self) -> bool {
        matches!(self, FallbackOutcome::Success | FallbackOutcome::Failure)
    }
}

impl fmt::Display for FallbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters held by a command bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCounter {
    Successes,
    ErrFailures,
    ErrBadRequests,
    ErrInterrupts,
    ErrTimeouts,
    ErrConcurrencyRejected,
    ErrShortCircuited,
}

impl CommandCounter {
    pub const ALL: [CommandCounter; 7] = [
        CommandCounter::Successes,
        CommandCounter::ErrFailures,
        CommandCounter::ErrBadRequests,
        CommandCounter::ErrInterrupts,
        CommandCounter::ErrTimeouts,
        CommandCounter::ErrConcurrencyRejected,
        CommandCounter::ErrShortCircuited,
    ];
}

/// Counters held by a fallback bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackCounter {
    Successes,
    ErrFailures,
    ErrBadRequests,
    ErrInterrupts,
    ErrConcurrencyRejected,
}

impl FallbackCounter {
    pub const ALL: [FallbackCounter; 5] = [
        FallbackCounter::Successes,
        FallbackCounter::ErrFailures,
        FallbackCounter::ErrBadRequests,
        FallbackCounter::ErrInterrupts,
        FallbackCounter::ErrConcurrencyRejected,
    ];
}

/// The one command counter an outcome increments.
pub fn classify(outcome: Outcome) -> CommandCounter {
    match outcome {
        Outcome::Success => CommandCounter::Successes,
        Outcome::Failure => CommandCounter::ErrFailures,
        Outcome::BadRequest => CommandCounter::ErrBadRequests,
        Outcome::Interrupt => CommandCounter::ErrInterrupts,
        Outcome::Timeout => CommandCounter::ErrTimeouts,
        Outcome::ConcurrencyRejected => CommandCounter::ErrConcurrencyRejected,
        Outcome::ShortCircuited => CommandCounter::ErrShortCircuited,
    }
}

/// The one fallback counter a fallback outcome increments.
pub fn classify_fallback(outcome: FallbackOutcome) -> FallbackCounter {
    match outcome {
        FallbackOutcome::Success => FallbackCounter::Successes,
        FallbackOutcome::Failure => FallbackCounter::ErrFailures,
        FallbackOutcome::BadRequest => FallbackCounter::ErrBadRequests,
        FallbackOutcome::Interrupt => FallbackCounter::ErrInterrupts,
        FallbackOutcome::ConcurrencyRejected => FallbackCounter::ErrConcurrencyRejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_classify_is_one_to_one() {
        let targets: HashSet<_> = Outcome::ALL.iter().map(|o| classify(*o)).collect();
        assert_eq!(targets.len(), Outcome::ALL.len());
        assert_eq!(targets.len(), CommandCounter::ALL.len());

        let fallback: HashSet<_> = FallbackOutcome::ALL
            .iter()
            .map(|o| classify_fallback(*o))
            .collect();
        assert_eq!(fallback.len(), FallbackCounter::ALL.len());
    }

    #[test]
    fn test_excluded_outcomes_skip_legitimate_counters() {
        for outcome in [Outcome::BadRequest, Outcome::Interrupt] {
            let counter = classify(outcome);
            assert_ne!(counter, CommandCounter::Successes);
            assert_ne!(counter, CommandCounter::ErrFailures);
            assert!(outcome.is_excluded());
            assert!(!outcome.is_legitimate());
        }

        for outcome in [FallbackOutcome::BadRequest, FallbackOutcome::Interrupt] {
            let counter = classify_fallback(outcome);
            assert_ne!(counter, FallbackCounter::Successes);
            assert_ne!(counter, FallbackCounter::ErrFailures);
            assert!(!outcome.is_legitimate());
        }
    }

    #[test]
    fn test_legitimate_outcomes() {
        let legit: Vec<_> = Outcome::ALL.iter().filter(|o| o.is_legitimate()).collect();
        assert_eq!(legit, vec![&Outcome::Success, &Outcome::Failure]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Outcome::BadRequest.to_string(), "bad_request");
        assert_eq!(FallbackOutcome::Failure.to_string(), "failure");
    }
}
