//! Time source and call context
//!
//! The engine never reads the wall clock on its own. Each operation receives
//! a [`CallContext`] carrying the caller and the timestamp the execution
//! environment assigned to the call.

use jobledger_types::{Address, Timestamp};
use serde::{Deserialize, Serialize};

/// Source of the current timestamp.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock, whole seconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually driven clock for replays and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedClock {
    at: Timestamp,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self { at }
    }

    pub fn set(&mut self, at: Timestamp) {
        self.at = at;
    }

    pub fn advance(&mut self, seconds: u64) {
        self.at = self.at.saturating_add(seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.at
    }
}

/// Who is calling, and when.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    pub fn from_clock(caller: Address, clock: &dyn Clock) -> Self {
        Self {
            caller,
            now: clock.now(),
        }
    }
}
