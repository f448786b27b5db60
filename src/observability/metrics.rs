//! Metrics facade hooks.
//!
//! # Metrics
//! - `circuit_stats_registrations_total` (counter): bundles created
//! - `circuit_stats_circuits` (gauge): circuits currently registered
//! - `circuit_stats_events_total` (counter): reported outcomes by circuit, path, event
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; a no-op until the host installs a recorder
//! - Event handles are resolved once per circuit at registration, so reporting
//!   does no label allocation or recorder lookup. Install the recorder before
//!   registering circuits.
//! - No exporter lives in this crate

use std::fmt;

use ::metrics::Counter;

use crate::metrics::{FallbackOutcome, Outcome};

pub fn record_registration(circuit: &str) {
    ::metrics::counter!("circuit_stats_registrations_total", "circuit" => circuit.to_string())
        .increment(1);
}

pub fn record_circuit_count(count: usize) {
    ::metrics::gauge!("circuit_stats_circuits").set(count as f64);
}

/// `circuit_stats_events_total` handles for one circuit, one per outcome.
#[derive(Clone)]
pub struct EventCounters {
    command: [Counter; Outcome::ALL.len()],
    fallback: [Counter; FallbackOutcome::ALL.len()],
}

impl EventCounters {
    pub fn new(circuit: &str) -> Self {
        Self {
            command: std::array::from_fn(|i| {
                event_counter(circuit, "command", Outcome::ALL[i].as_str())
            }),
            fallback: std::array::from_fn(|i| {
                event_counter(circuit, "fallback", FallbackOutcome::ALL[i].as_str())
            }),
        }
    }

    // `ALL` lists variants in declaration order, so the discriminant is the index.
    pub fn record_command(&self, outcome: Outcome) {
        self.command[outcome as usize].increment(1);
    }

    pub fn record_fallback(&self, outcome: FallbackOutcome) {
        self.fallback[outcome as usize].increment(1);
    }
}

impl fmt::Debug for EventCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCounters").finish_non_exhaustive()
    }
}

fn event_counter(circuit: &str, path: &'static str, event: &'static str) -> Counter {
    ::metrics::counter!(
        "circuit_stats_events_total",
        "circuit" => circuit.to_string(),
        "path" => path,
        "event" => event
    )
}
