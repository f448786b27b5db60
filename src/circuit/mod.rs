//! Minimal guarded execution.
//!
//! # Data Flow
//! ```text
//! Circuit::execute(ctx, run)
//!     → force_open?          → ShortCircuited
//!     → limiter.rs permit?   → ConcurrencyRejected
//!     → run() under own timeout, raced against ctx deadline and cancel
//!         own timeout        → Timeout
//!         ctx deadline       → Interrupt
//!         ctx cancel         → Interrupt
//!         Ok / BadRequest / Failed
//!     → CircuitMetrics::report(outcome, now)
//!     → fallback (if allowed), raced against the same ctx
//!     → CircuitMetrics::report_fallback(outcome, now)
//! ```
//!
//! # Design Decisions
//! - No trip logic; this only exists to drive the reporting hook
//! - Interrupted executions never run the fallback, so the fallback bundle
//!   sees nothing for them
//! - Bad requests skip the fallback as well
//! - A fallback still running when the ctx fires is a fallback interrupt

pub mod cancel;
pub mod error;
pub mod executor;
pub mod limiter;

pub use cancel::CancelHandle;
pub use error::{CircuitError, OperationError};
pub use executor::{Circuit, ExecContext, ExecutionConfig};
pub use limiter::ConcurrencyLimiter;
