//! Guarded execution that reports every outcome to the circuit's metrics.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::circuit::cancel::CancelHandle;
use crate::circuit::error::{CircuitError, OperationError};
use crate::circuit::limiter::ConcurrencyLimiter;
use crate::config::ConfigError;
use crate::metrics::{FallbackOutcome, Outcome};
use crate::registry::{CircuitMetrics, RegistrationOptions, Registry};

/// Execution settings for one circuit.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// The circuit's own timeout. Expiry is a `Timeout`, not an interrupt.
    pub timeout: Duration,

    /// Maximum concurrent primary executions. `None` = unlimited.
    pub max_concurrent: Option<usize>,

    /// Maximum concurrent fallback executions. `None` = unlimited.
    pub fallback_max_concurrent: Option<usize>,

    /// Reject every execution as short-circuited.
    pub force_open: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            max_concurrent: Some(10),
            fallback_max_concurrent: Some(10),
            force_open: false,
        }
    }
}

/// Deadline and cancel signal inherited from the caller.
///
/// When either fires before the operation finishes the attempt is recorded
/// as an interrupt. The same applies to a running fallback.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    deadline: Option<tokio::time::Instant>,
    cancel: Option<CancelHandle>,
}

impl ExecContext {
    /// No deadline, no cancel.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: tokio::time::Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(tokio::time::Instant::now() + timeout)
    }

    /// Attach a cancel signal. Calling `cancel` on the handle interrupts
    /// every execution running under this context or its children.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Child context; the earlier of the two deadlines wins and the cancel
    /// signal is shared.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = tokio::time::Instant::now() + timeout;
        Self {
            deadline: Some(self.deadline.map_or(own, |d| d.min(own))),
            cancel: self.cancel.clone(),
        }
    }

    pub fn deadline(&self) -> Option<tokio::time::Instant> {
        self.deadline
    }

    pub fn cancel_handle(&self) -> Option<&CancelHandle> {
        self.cancel.as_ref()
    }

    /// Resolves when the deadline passes or the context is cancelled.
    /// Never resolves for a background context.
    async fn interrupted(&self) {
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        let cancelled = async {
            match &self.cancel {
                Some(cancel) => cancel.cancelled().await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = deadline => {}
            _ = cancelled => {}
        }
    }
}

/// A named unit of guarded work.
///
/// There is no trip logic here; `force_open` is the only way to short-circuit.
#[derive(Debug)]
pub struct Circuit {
    config: ExecutionConfig,
    metrics: CircuitMetrics,
    limiter: ConcurrencyLimiter,
    fallback_limiter: ConcurrencyLimiter,
}

impl Circuit {
    /// Create a circuit and attach it to `name`'s bundles in `registry`.
    pub fn new(
        registry: &Registry,
        name: &str,
        config: ExecutionConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_options(registry, name, config, RegistrationOptions::default())
    }

    pub fn with_options(
        registry: &Registry,
        name: &str,
        config: ExecutionConfig,
        options: RegistrationOptions,
    ) -> Result<Self, ConfigError> {
        let metrics = registry.register(name, options)?;
        Ok(Self {
            limiter: ConcurrencyLimiter::new(config.max_concurrent),
            fallback_limiter: ConcurrencyLimiter::new(config.fallback_max_concurrent),
            config,
            metrics,
        })
    }

    pub fn metrics(&self) -> &CircuitMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Run `run` without a fallback.
    pub async fn execute<T, F, Fut>(&self, ctx: &ExecContext, run: F) -> Result<T, CircuitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        self.run_primary(ctx, run).await
    }

    /// Run `run`; on a failure, timeout or rejection run `fallback` with the
    /// primary error. Bad requests and interrupts skip the fallback.
    ///
    /// The fallback runs under the same context, so a deadline or cancel that
    /// fires while it runs is recorded as a fallback interrupt.
    pub async fn execute_with_fallback<T, F, Fut, FB, FBFut>(
        &self,
        ctx: &ExecContext,
        run: F,
        fallback: FB,
    ) -> Result<T, CircuitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
        FB: FnOnce(CircuitError) -> FBFut,
        FBFut: Future<Output = Result<T, OperationError>>,
    {
        match self.run_primary(ctx, run).await {
            Ok(value) => Ok(value),
            Err(err) if !err.allows_fallback() => Err(err),
            Err(err) => self.run_fallback(ctx, err, fallback).await,
        }
    }

    async fn run_primary<T, F, Fut>(&self, ctx: &ExecContext, run: F) -> Result<T, CircuitError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, OperationError>>,
    {
        if self.config.force_open {
            self.metrics.report(Outcome::ShortCircuited, Instant::now());
            return Err(CircuitError::ShortCircuited);
        }

        let Some(_permit) = self.limiter.try_acquire() else {
            self.metrics.report(Outcome::ConcurrencyRejected, Instant::now());
            return Err(CircuitError::ConcurrencyRejected);
        };

        let attempt = tokio::time::timeout(self.config.timeout, run());
        let finished = tokio::select! {
            biased;
            res = attempt => Some(res),
            _ = ctx.interrupted() => None,
        };

        let (outcome, result) = match finished {
            None => (Outcome::Interrupt, Err(CircuitError::Interrupted)),
            Some(Err(_elapsed)) => (
                Outcome::Timeout,
                Err(CircuitError::Timeout(self.config.timeout)),
            ),
            Some(Ok(Ok(value))) => (Outcome::Success, Ok(value)),
            Some(Ok(Err(OperationError::BadRequest(msg)))) => {
                (Outcome::BadRequest, Err(CircuitError::BadRequest(msg)))
            }
            Some(Ok(Err(OperationError::Failed(msg)))) => {
                (Outcome::Failure, Err(CircuitError::Failed(msg)))
            }
        };

        self.metrics.report(outcome, Instant::now());
        if outcome != Outcome::Success {
            tracing::debug!(
                circuit = %self.metrics.key(),
                event = %outcome,
                "Execution did not succeed"
            );
        }
        result
    }

    async fn run_fallback<T, FB, FBFut>(
        &self,
        ctx: &ExecContext,
        primary: CircuitError,
        fallback: FB,
    ) -> Result<T, CircuitError>
    where
        FB: FnOnce(CircuitError) -> FBFut,
        FBFut: Future<Output = Result<T, OperationError>>,
    {
        let Some(_permit) = self.fallback_limiter.try_acquire() else {
            self.metrics
                .report_fallback(FallbackOutcome::ConcurrencyRejected, Instant::now());
            return Err(CircuitError::FallbackRejected {
                primary: Box::new(primary),
            });
        };

        let attempt = fallback(primary.clone());
        let finished = tokio::select! {
            biased;
            res = attempt => Some(res),
            _ = ctx.interrupted() => None,
        };

        let primary = Box::new(primary);
        let (outcome, result) = match finished {
            None => (
                FallbackOutcome::Interrupt,
                Err(CircuitError::FallbackInterrupted { primary }),
            ),
            Some(Ok(value)) => (FallbackOutcome::Success, Ok(value)),
            Some(Err(fallback @ OperationError::BadRequest(_))) => (
                FallbackOutcome::BadRequest,
                Err(CircuitError::FallbackFailed { primary, fallback }),
            ),
            Some(Err(fallback @ OperationError::Failed(_))) => (
                FallbackOutcome::Failure,
                Err(CircuitError::FallbackFailed { primary, fallback }),
            ),
        };

        self.metrics.report_fallback(outcome, Instant::now());
        if outcome != FallbackOutcome::Success {
            tracing::debug!(
                circuit = %self.metrics.key(),
                event = %outcome,
                "Fallback did not succeed"
            );
        }
        result
    }
}
