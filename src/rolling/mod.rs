//! Rolling-window counters.
//!
//! # Data Flow
//! ```text
//! increment_at(t)
//!     → bucket id = (t - origin) / bucket_duration
//!     → rotate ring forward if t is newer than the open bucket
//!     → add 1 to the open bucket and to the lifetime total
//!
//! rolling_sum_at(t)
//!     → sum of buckets in (t - window, t], no mutation
//! ```
//!
//! # Design Decisions
//! - Callers pass timestamps explicitly; nothing here reads the clock except
//!   `RollingCounter::new` to pick an origin
//! - Lifetime totals are atomic and never rotate
//! - Rolling figures never move backward in time

pub mod counter;

pub use counter::{CounterSnapshot, RollingCounter};
