//! Bucketed rolling counter.
//!
//! A ring of `num_buckets` atomic slots, each covering `bucket_duration` of
//! time, plus a lifetime total that never rotates.
//!
//! # Concurrency
//! - `head` is the id of the newest bucket. It is guarded by an `RwLock`.
//! - Increments into the open bucket and all reads hold the read lock, so they
//!   run in parallel and touch the slots only through atomics.
//! - Rotation takes the write lock and re-checks `head` before advancing, so
//!   racing rotators zero each skipped slot exactly once and no increment can
//!   land in a slot while it is being cleared.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::validation::validate_rolling;
use crate::config::{ConfigError, RollingConfig};

/// Point-in-time view of a counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub rolling: u64,
    pub total: u64,
}

#[derive(Debug)]
pub struct RollingCounter {
    origin: Instant,
    bucket_width: Duration,
    buckets: Box<[AtomicU64]>,
    head: RwLock<u64>,
    total: AtomicU64,
}

impl RollingCounter {
    /// Create a counter whose bucket 0 starts now.
    pub fn new(config: &RollingConfig) -> Result<Self, ConfigError> {
        Self::starting_at(config, Instant::now())
    }

    /// Create a counter whose bucket 0 starts at `origin`.
    pub fn starting_at(config: &RollingConfig, origin: Instant) -> Result<Self, ConfigError> {
        validate_rolling("rolling", config)?;

        let buckets = (0..config.num_buckets).map(|_| AtomicU64::new(0)).collect();
        Ok(Self {
            origin,
            bucket_width: config.bucket_duration(),
            buckets,
            head: RwLock::new(0),
            total: AtomicU64::new(0),
        })
    }

    pub fn bucket_duration(&self) -> Duration {
        self.bucket_width
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the rolling window.
    pub fn window(&self) -> Duration {
        self.bucket_width * self.buckets.len() as u32
    }

    /// Count one event at `t`.
    ///
    /// Events older than the open bucket only reach the lifetime total.
    pub fn increment_at(&self, t: Instant) {
        self.total.fetch_add(1, Ordering::SeqCst);
        let id = self.bucket_id(t);

        {
            let head = self.head.read().unwrap_or_else(PoisonError::into_inner);
            if id <= *head {
                if id == *head {
                    self.slot(id).fetch_add(1, Ordering::Relaxed);
                }
                return;
            }
        }

        let mut head = self.head.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have rotated while we waited for the lock.
        if id > *head {
            self.advance(&mut head, id);
        }
        if id == *head {
            self.slot(id).fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Sum of the buckets inside the window ending at `t`.
    ///
    /// Stale buckets are skipped rather than cleared; reads never rotate.
    pub fn rolling_sum_at(&self, t: Instant) -> u64 {
        let id = self.bucket_id(t);
        let span = self.buckets.len() as u64 - 1;

        let head = self.head.read().unwrap_or_else(PoisonError::into_inner);
        // Intersection of the stored ring and the queried window.
        let newest = (*head).min(id);
        let oldest = (*head).max(id).saturating_sub(span);
        if oldest > newest {
            return 0;
        }
        (oldest..=newest)
            .map(|b| self.slot(b).load(Ordering::Relaxed))
            .sum()
    }

    /// Lifetime count, independent of the window.
    pub fn total_sum(&self) -> u64 {
        self.total.load(Ordering::SeqCst)
    }

    pub fn snapshot_at(&self, t: Instant) -> CounterSnapshot {
        CounterSnapshot {
            rolling: self.rolling_sum_at(t),
            total: self.total_sum(),
        }
    }

    fn bucket_id(&self, t: Instant) -> u64 {
        let elapsed = t.saturating_duration_since(self.origin);
        (elapsed.as_nanos() / self.bucket_width.as_nanos()) as u64
    }

    fn slot(&self, id: u64) -> &AtomicU64 {
        &self.buckets[(id % self.buckets.len() as u64) as usize]
    }

    /// Move `head` forward to `id`, clearing every slot reused on the way.
    /// Caller holds the write lock.
    fn advance(&self, head: &mut u64, id: u64) {
        let skipped = id - *head;
        if skipped >= self.buckets.len() as u64 {
            for slot in self.buckets.iter() {
                slot.store(0, Ordering::Relaxed);
            }
        } else {
            for b in (*head + 1)..=id {
                self.slot(b).store(0, Ordering::Relaxed);
            }
        }
        *head = id;
    }
}
