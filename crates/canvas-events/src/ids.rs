//! Identifier Types
//!
//! Cursor ids, canonical pair keys and the binary affinity category.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a cursor for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorId(pub u32);

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unordered pair of cursors, stored as `(min, max)`.
///
/// Both orderings of the same two ids produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    low: CursorId,
    high: CursorId,
}

impl PairKey {
    pub fn new(a: CursorId, b: CursorId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> CursorId {
        self.low
    }

    pub fn high(&self) -> CursorId {
        self.high
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low.0, self.high.0)
    }
}

/// Binary affinity category. Only cross-category pairs interact on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    A,
    B,
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affinity::A => write!(f, "a"),
            Affinity::B => write!(f, "b"),
        }
    }
}
