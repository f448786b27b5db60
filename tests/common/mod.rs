//! Shared operations and fixtures for integration tests.

use std::time::Duration;

use circuit_stats::{CircuitError, OperationError, Registry, StatsConfig};

pub fn registry() -> Registry {
    Registry::new(StatsConfig::default()).unwrap()
}

pub async fn always_passes() -> Result<(), OperationError> {
    Ok(())
}

pub async fn always_fails() -> Result<(), OperationError> {
    Err(OperationError::failed("failure"))
}

#[allow(dead_code)]
pub async fn always_passes_fallback(_: CircuitError) -> Result<(), OperationError> {
    Ok(())
}

/// An operation that takes `d` to finish.
#[allow(dead_code)]
pub async fn sleeps_for(d: Duration) -> Result<(), OperationError> {
    tokio::time::sleep(d).await;
    Ok(())
}
