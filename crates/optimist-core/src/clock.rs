//! # Clock
//!
//! Source of "now" for every time-dependent protocol decision. Production
//! wiring uses [`SystemClock`]; tests and simulations use [`ManualClock`],
//! which only moves when told to.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CoreError;
use crate::temporal::Timestamp;

/// Supplies the current time.
pub trait Clock: Send + Sync {
    /// The current time at second precision.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// A clock that is set and advanced explicitly.
///
/// Clones share the same underlying instant, so a test can hand one clone
/// to the oracle and keep another to drive time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// A clock frozen at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// A clock frozen at the given Unix epoch second.
    pub fn at_epoch_secs(secs: i64) -> Result<Self, CoreError> {
        Ok(Self::new(Timestamp::from_epoch_secs(secs)?))
    }

    /// Jump to `to`. Moving backwards is allowed; simulations use it to
    /// replay scenarios.
    pub fn set(&self, to: Timestamp) {
        *self.now.lock() = to;
    }

    /// Move forward by `secs` and return the new time.
    pub fn advance(&self, secs: u64) -> Result<Timestamp, CoreError> {
        let mut guard = self.now.lock();
        let next = guard.checked_add_secs(secs).ok_or_else(|| CoreError::Overflow {
            operation: format!("advance clock by {secs}s"),
        })?;
        *guard = next;
        Ok(next)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
