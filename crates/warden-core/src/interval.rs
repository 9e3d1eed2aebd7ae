//! A closed time range `[start, end]`.

use serde::Serialize;
use std::fmt;

use crate::Timestamp;

/// A closed time range. Always satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

impl Interval {
    /// Build an interval, or `None` when `end` precedes `start`.
    ///
    /// An inverted range (e.g. a credential whose expiry precedes its
    /// creation) is empty rather than an error.
    pub fn new(start: Timestamp, end: Timestamp) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Inclusive upper bound.
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Whether the two intervals share at least one instant.
    ///
    /// Symmetric: `a.overlaps(&b) == b.overlaps(&a)`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// Whether the two intervals overlap or sit back to back with no
    /// instant between them.
    pub fn touches(&self, other: &Interval) -> bool {
        self.overlaps(other)
            || self.end.successor() == Some(other.start)
            || other.end.successor() == Some(self.start)
    }

    /// Widen this interval to also cover `other`.
    ///
    /// Callers only merge intervals that [`touch`](Self::touches); merging
    /// disjoint intervals would claim the gap between them.
    pub fn merge(&mut self, other: &Interval) {
        debug_assert!(self.touches(other), "merging disjoint intervals");
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
    }

    /// Whether `at` lies within the interval, inclusive of both bounds.
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at <= self.end
    }

    /// Covered span in nanoseconds (zero for a single instant).
    pub fn duration_nanos(&self) -> u128 {
        (i128::from(self.end.as_nanos()) - i128::from(self.start.as_nanos())) as u128
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
