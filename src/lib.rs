//! Rolling-window statistics for circuit-breaker style execution.
//!
//! # Architecture Overview
//!
//! ```text
//!   breaker runtime ──report(outcome, t)──▶ CircuitMetrics ──classify──▶ CommandMetrics
//!                   ──report_fallback────▶               ──classify──▶ FallbackMetrics
//!                                                                           │
//!                                                                  RollingCounter × N
//!
//!   Registry: CircuitKey → CircuitMetrics (created once, shared)
//! ```

// Core
pub mod metrics;
pub mod registry;
pub mod rolling;

// Execution wrapper
pub mod circuit;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use circuit::{
    CancelHandle, Circuit, CircuitError, ExecContext, ExecutionConfig, OperationError,
};
pub use config::{ConfigError, RollingConfig, StatsConfig};
pub use metrics::{CommandMetrics, FallbackMetrics, FallbackOutcome, Outcome};
pub use registry::{CircuitKey, CircuitMetrics, RegistrationOptions, Registry};
pub use rolling::RollingCounter;
