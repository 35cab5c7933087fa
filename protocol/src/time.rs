//! # Time
//!
//! The ledger only ever sees time through a [`Clock`]. There is no
//! background timer: anything time-dependent (lock maturity) is evaluated
//! against `clock.now()` at the moment an action runs.
//!
//! Time has second granularity and is stored as a `u32` count of seconds
//! since the Unix epoch, which keeps lock entries compact on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Seconds since the Unix epoch.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn secs(&self) -> u32 {
        self.0
    }

    /// Adds a delay, returning `None` past the year 2106.
    pub fn checked_add_secs(&self, secs: u32) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Converts a chrono timestamp, clamping to the representable range.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        let ts = dt.timestamp();
        Self(u32::try_from(ts.max(0)).unwrap_or(u32::MAX))
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.0), 0)
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// Source of the current time for an action.
pub trait Clock {
    fn now(&self) -> TimePointSec;
}

/// Wall-clock time from the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimePointSec {
        TimePointSec::from_datetime(Utc::now())
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hold one handle
/// and advance it while the ledger holds another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    secs: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(start: TimePointSec) -> Self {
        Self {
            secs: Arc::new(AtomicU32::new(start.secs())),
        }
    }

    pub fn set(&self, time: TimePointSec) {
        self.secs.store(time.secs(), Ordering::SeqCst);
    }

    /// Moves the clock forward, saturating at `u32::MAX`.
    pub fn advance(&self, secs: u32) {
        let _ = self
            .secs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                Some(cur.saturating_add(secs))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimePointSec {
        TimePointSec(self.secs.load(Ordering::SeqCst))
    }
}
