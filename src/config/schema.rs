//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the statistics engine.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the statistics engine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct StatsConfig {
    /// Default rolling window used by every circuit without an override.
    pub rolling: RollingConfig,

    /// Attach a fallback bundle to newly registered circuits.
    pub track_fallback: bool,

    /// Per-circuit window overrides, keyed by circuit name.
    pub circuits: HashMap<String, CircuitOverride>,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl StatsConfig {
    /// Window configuration for `circuit`, honoring overrides.
    pub fn rolling_for(&self, circuit: &str) -> RollingConfig {
        self.circuits
            .get(circuit)
            .and_then(|o| o.rolling.clone())
            .unwrap_or_else(|| self.rolling.clone())
    }

    /// Whether `circuit` gets a fallback bundle.
    pub fn fallback_for(&self, circuit: &str) -> bool {
        self.circuits
            .get(circuit)
            .and_then(|o| o.track_fallback)
            .unwrap_or(self.track_fallback)
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            rolling: RollingConfig::default(),
            track_fallback: true,
            circuits: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Rolling window shape: `num_buckets` slices of `bucket_duration_ms` each.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RollingConfig {
    /// Width of one bucket in milliseconds.
    pub bucket_duration_ms: u64,

    /// Number of buckets in the ring.
    pub num_buckets: u32,
}

impl RollingConfig {
    /// Buckets have millisecond resolution. A partial millisecond rounds up,
    /// so only a zero duration yields a zero (invalid) width.
    pub fn new(bucket_duration: Duration, num_buckets: u32) -> Self {
        let partial = bucket_duration.subsec_nanos() % 1_000_000 != 0;
        let millis = bucket_duration.as_millis() + u128::from(partial);
        Self {
            bucket_duration_ms: u64::try_from(millis).unwrap_or(u64::MAX),
            num_buckets,
        }
    }

    pub fn bucket_duration(&self) -> Duration {
        Duration::from_millis(self.bucket_duration_ms)
    }

    /// Total window covered by the ring.
    pub fn window(&self) -> Duration {
        self.bucket_duration() * self.num_buckets
    }
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            bucket_duration_ms: 1000,
            num_buckets: 10,
        }
    }
}

/// Per-circuit settings. Unset fields inherit from the root config.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CircuitOverride {
    pub rolling: Option<RollingConfig>,
    pub track_fallback: Option<bool>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) used when `RUST_LOG` is unset.
    pub level: String,

    /// Include the event target in formatted output.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
        }
    }
}
