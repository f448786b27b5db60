//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry and reporting hooks produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (facade counters and gauges)
//! ```
//!
//! # Design Decisions
//! - Structured fields, circuit key on every event
//! - Per-event logs are trace level; registration is info

pub mod logging;
pub mod metrics;
