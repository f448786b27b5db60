//! Metrics bundles subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker runtime reports an outcome:
//!     → outcome.rs (classify: outcome → exactly one counter)
//!     → command.rs / fallback.rs (increment that counter at t)
//!
//! Queries:
//!     → errors_at / legitimate_attempts_at (composites)
//!     → per-counter rolling_sum_at / total_sum
//! ```
//!
//! # Design Decisions
//! - Command and fallback bundles are independent; a failed command with a
//!   working fallback still counts one command error
//! - Bad requests and interrupts are tracked but excluded from errors and
//!   legitimate attempts
//! - Recording is crate-private; callers report through `CircuitMetrics`

pub mod command;
pub mod fallback;
pub mod outcome;

pub use command::{CommandMetrics, CommandSnapshot};
pub use fallback::{FallbackMetrics, FallbackSnapshot};
pub use outcome::{
    classify, classify_fallback, CommandCounter, FallbackCounter, FallbackOutcome, Outcome,
};
