//! Timestamps in signed nanoseconds since the Unix epoch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time, in nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Earliest representable timestamp.
    pub const MIN: Timestamp = Timestamp(i64::MIN);

    /// Latest representable timestamp.
    pub const MAX: Timestamp = Timestamp(i64::MAX);

    /// Create a timestamp from raw nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a timestamp from whole seconds, saturating on overflow.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(1_000_000_000))
    }

    /// Raw nanoseconds.
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// The next representable timestamp, if any.
    pub fn successor(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self::from_nanos(value)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
