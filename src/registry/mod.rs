//! Circuit registry.
//!
//! # Responsibilities
//! - Lazily build the command/fallback bundle pair for a circuit
//! - Hand every caller the same instance for the same key
//! - Surface bad window configuration at registration time
//!
//! # Design Decisions
//! - Explicit object owned by the host, no global state
//! - Sharded concurrent map; the entry API makes first-writer-wins atomic
//! - Config swaps only affect circuits registered afterwards

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, RollingConfig, StatsConfig};
use crate::metrics::{CommandMetrics, FallbackMetrics, FallbackOutcome, Outcome};
use crate::observability::metrics;

/// Identifies a circuit inside a namespace.
///
/// The prefix keeps collectors apart when several attach to the same circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CircuitKey {
    prefix: String,
    circuit: String,
}

impl CircuitKey {
    pub fn new(circuit: impl Into<String>) -> Self {
        Self::with_prefix("", circuit)
    }

    pub fn with_prefix(prefix: impl Into<String>, circuit: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            circuit: circuit.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn circuit(&self) -> &str {
        &self.circuit
    }
}

impl fmt::Display for CircuitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.circuit)
        } else {
            write!(f, "{}.{}", self.prefix, self.circuit)
        }
    }
}

/// Per-registration settings. Unset fields come from the registry config.
#[derive(Debug, Clone, Default)]
pub struct RegistrationOptions {
    pub prefix: String,
    pub rolling: Option<RollingConfig>,
    pub track_fallback: Option<bool>,
}

impl RegistrationOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }
}

/// Shared handle to the bundles of one circuit. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CircuitMetrics {
    key: Arc<CircuitKey>,
    label: Arc<str>,
    events: metrics::EventCounters,
    command: Arc<CommandMetrics>,
    fallback: Option<Arc<FallbackMetrics>>,
}

impl CircuitMetrics {
    fn build(
        key: CircuitKey,
        rolling: &RollingConfig,
        track_fallback: bool,
    ) -> Result<Self, ConfigError> {
        let origin = Instant::now();
        let command = CommandMetrics::starting_at(rolling, origin)?;
        let fallback = if track_fallback {
            Some(Arc::new(FallbackMetrics::starting_at(rolling, origin)?))
        } else {
            None
        };

        let label: Arc<str> = key.to_string().into();
        Ok(Self {
            events: metrics::EventCounters::new(&label),
            label,
            key: Arc::new(key),
            command: Arc::new(command),
            fallback,
        })
    }

    pub fn key(&self) -> &CircuitKey {
        &self.key
    }

    pub fn command(&self) -> &CommandMetrics {
        &self.command
    }

    pub fn fallback(&self) -> Option<&FallbackMetrics> {
        self.fallback.as_deref()
    }

    /// True when both handles point at the same bundles.
    pub fn same_instance(&self, other: &CircuitMetrics) -> bool {
        Arc::ptr_eq(&self.command, &other.command)
    }

    /// Report the outcome of one primary execution attempt.
    pub fn report(&self, outcome: Outcome, at: Instant) {
        self.command.record(outcome, at);
        self.events.record_command(outcome);
        tracing::trace!(circuit = %self.label, event = %outcome, "Command outcome recorded");
    }

    /// Report the outcome of one fallback attempt.
    ///
    /// Ignored when the circuit was registered without a fallback bundle.
    pub fn report_fallback(&self, outcome: FallbackOutcome, at: Instant) {
        match &self.fallback {
            Some(fallback) => {
                fallback.record(outcome, at);
                self.events.record_fallback(outcome);
                tracing::trace!(
                    circuit = %self.label,
                    event = %outcome,
                    "Fallback outcome recorded"
                );
            }
            None => {
                tracing::debug!(
                    circuit = %self.label,
                    event = %outcome,
                    "No fallback metrics attached, outcome ignored"
                );
            }
        }
    }
}

/// Maps circuit keys to their metrics bundles.
pub struct Registry {
    config: ArcSwap<StatsConfig>,
    circuits: DashMap<CircuitKey, CircuitMetrics>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("circuits", &self.circuits.len())
            .finish()
    }
}

impl Registry {
    /// Create a registry. The config is validated up front.
    pub fn new(config: StatsConfig) -> Result<Self, ConfigError> {
        validate_config(&config)?;
        tracing::info!(
            bucket_duration_ms = config.rolling.bucket_duration_ms,
            num_buckets = config.rolling.num_buckets,
            overrides = config.circuits.len(),
            "Metrics registry created"
        );

        Ok(Self {
            config: ArcSwap::from_pointee(config),
            circuits: DashMap::new(),
        })
    }

    /// Config used for new registrations.
    pub fn config(&self) -> Arc<StatsConfig> {
        self.config.load_full()
    }

    /// Replace the config for future registrations. Invalid configs are rejected
    /// and the current one is kept.
    pub fn apply_config(&self, config: StatsConfig) -> Result<(), ConfigError> {
        validate_config(&config)?;
        tracing::info!(
            bucket_duration_ms = config.rolling.bucket_duration_ms,
            num_buckets = config.rolling.num_buckets,
            "Registry configuration updated"
        );
        self.config.store(Arc::new(config));
        Ok(())
    }

    /// Bundles for `circuit` in the default namespace, created on first use.
    pub fn bundles_for(&self, circuit: &str) -> Result<CircuitMetrics, ConfigError> {
        self.register(circuit, RegistrationOptions::default())
    }

    /// Bundles for `circuit` under `options.prefix`, created on first use.
    ///
    /// Later calls for the same key return the first instance; their options
    /// are ignored.
    pub fn register(
        &self,
        circuit: &str,
        options: RegistrationOptions,
    ) -> Result<CircuitMetrics, ConfigError> {
        let key = CircuitKey::with_prefix(options.prefix, circuit);
        if let Some(existing) = self.circuits.get(&key) {
            return Ok(existing.value().clone());
        }

        let created = match self.circuits.entry(key) {
            Entry::Occupied(e) => {
                tracing::debug!(
                    circuit = %e.key(),
                    "Lost registration race, using existing bundles"
                );
                return Ok(e.get().clone());
            }
            Entry::Vacant(e) => {
                let config = self.config.load();
                let rolling = options.rolling.unwrap_or_else(|| config.rolling_for(circuit));
                let track_fallback = options
                    .track_fallback
                    .unwrap_or_else(|| config.fallback_for(circuit));

                let bundles = CircuitMetrics::build(e.key().clone(), &rolling, track_fallback)
                    .map_err(|err| {
                        tracing::error!(
                            circuit = %e.key(),
                            error = %err,
                            "Circuit failed to register metrics"
                        );
                        err
                    })?;
                tracing::info!(
                    circuit = %e.key(),
                    bucket_duration_ms = rolling.bucket_duration_ms,
                    num_buckets = rolling.num_buckets,
                    track_fallback,
                    "Circuit metrics registered"
                );
                e.insert(bundles.clone());
                bundles
            }
        };

        // Shard locks are released by now; len() takes them all.
        metrics::record_registration(&created.label);
        metrics::record_circuit_count(self.circuits.len());
        Ok(created)
    }

    /// Lookup without creating.
    pub fn find(&self, key: &CircuitKey) -> Option<CircuitMetrics> {
        self.circuits.get(key).map(|r| r.value().clone())
    }

    /// Lookup in the default namespace.
    pub fn find_circuit(&self, circuit: &str) -> Option<CircuitMetrics> {
        self.find(&CircuitKey::new(circuit))
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<CircuitKey> {
        let mut keys: Vec<_> = self.circuits.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }
}
