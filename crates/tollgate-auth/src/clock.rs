//! Time sources.
//!
//! Every expiry decision in this crate reads the current instant through a
//! [`Clock`], so stores, the codec and the introspection resolver can be
//! driven by simulated time in tests.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use time::OffsetDateTime;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current instant.
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
///
/// Reads are lock-free, so a single instance can be shared by every
/// component under test.
pub struct ManualClock {
    now: ArcSwap<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: ArcSwap::from_pointee(start),
        }
    }

    /// Creates a clock frozen at the current wall-clock instant.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.rcu(|current| **current + by);
    }

    /// Jumps to an arbitrary instant, including backwards.
    pub fn set(&self, instant: OffsetDateTime) {
        self.now.store(Arc::new(instant));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        **self.now.load()
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now())
            .finish()
    }
}
