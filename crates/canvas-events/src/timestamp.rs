//! Simulation Time
//!
//! Millisecond timestamps on the simulation timeline. The timeline is driven
//! either by a synthetic clock (tests, headless runs) or by elapsed wall time.
//!
//! # Example
//!
//! ```
//! use canvas_events::SimTime;
//!
//! let start = SimTime::from_millis(1_000);
//! let later = start.plus_millis(3_001);
//! assert_eq!(later.saturating_since(start), 3_001);
//! assert_eq!(later.clock_label(), "00:04");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Point on the simulation timeline, in milliseconds since the run started.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn plus_millis(self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds elapsed since `earlier`, or 0 if `earlier` is in the future.
    pub fn saturating_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// `mm:ss` label used next to chat messages.
    pub fn clock_label(self) -> String {
        let total_secs = self.0 / 1000;
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
