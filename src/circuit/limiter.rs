//! Concurrency limit for in-flight executions.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Caps the number of concurrently held permits. `None` means unlimited.
#[derive(Debug)]
pub struct ConcurrencyLimiter {
    max: Option<usize>,
    active: AtomicUsize,
}

impl ConcurrencyLimiter {
    pub fn new(max: Option<usize>) -> Self {
        Self {
            max,
            active: AtomicUsize::new(0),
        }
    }

    /// Number of permits currently held.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Take a permit unless the limit is reached.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut prev = self.active.load(Ordering::Relaxed);
        loop {
            if self.max.is_some_and(|max| prev >= max) {
                return None;
            }
            match self.active.compare_exchange_weak(
                prev,
                prev + 1,
                Ordering::Acquire,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => prev = x,
            }
        }
        Some(Permit { limiter: self })
    }
}

/// A RAII guard that releases its slot on drop.
#[derive(Debug)]
pub struct Permit<'a> {
    limiter: &'a ConcurrencyLimiter,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.limiter.active.fetch_sub(1, Ordering::Release);
    }
}
