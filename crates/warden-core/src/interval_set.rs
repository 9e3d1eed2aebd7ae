//! Interval sets and canonical valid-range sets.
//!
//! [`IntervalSet`] is a working collection: intervals are appended as they
//! are discovered and nothing is merged until [`IntervalSet::compress`] runs,
//! since merging is cheapest as one batched pass. Compression yields a
//! [`ValidRangeSet`], whose ranges are pairwise disjoint, never abut, and are
//! sorted by start.

use serde::Serialize;
use std::fmt;

use crate::{Interval, Timestamp};

/// An unordered, uncompressed collection of intervals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interval without merging.
    pub fn add(&mut self, interval: Interval) {
        self.intervals.push(interval);
    }

    /// Number of intervals added so far.
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Intervals in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.intervals.iter()
    }

    /// Coalesce into a canonical, start-sorted set of disjoint ranges.
    pub fn compress(&self) -> ValidRangeSet {
        ValidRangeSet {
            ranges: coalesce(self.intervals.iter().copied()),
        }
    }
}

impl FromIterator<Interval> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        Self {
            intervals: iter.into_iter().collect(),
        }
    }
}

impl Extend<Interval> for IntervalSet {
    fn extend<I: IntoIterator<Item = Interval>>(&mut self, iter: I) {
        self.intervals.extend(iter);
    }
}

impl From<ValidRangeSet> for IntervalSet {
    fn from(value: ValidRangeSet) -> Self {
        Self {
            intervals: value.ranges,
        }
    }
}

/// Canonical set of time ranges during which access was provably held.
///
/// Scoped to one (resource, principal, permission) triple and rebuilt on
/// every read; it is never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidRangeSet {
    ranges: Vec<Interval>,
}

impl ValidRangeSet {
    /// The empty set: no access at any time.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Union `other` into this set, keeping it canonical.
    pub fn merge_from(&mut self, other: &ValidRangeSet) {
        if other.is_empty() {
            return;
        }
        let inputs = std::mem::take(&mut self.ranges);
        self.ranges = coalesce(inputs.into_iter().chain(other.ranges.iter().copied()));
    }

    /// Whether no range is present (default-deny).
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of disjoint ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Ranges in ascending start order.
    pub fn iter(&self) -> impl Iterator<Item = &Interval> {
        self.ranges.iter()
    }

    /// Ranges as a slice, ascending by start.
    pub fn as_slice(&self) -> &[Interval] {
        &self.ranges
    }

    /// Whether `at` falls inside any range.
    pub fn contains(&self, at: Timestamp) -> bool {
        let idx = self.ranges.partition_point(|range| range.end() < at);
        self.ranges.get(idx).is_some_and(|range| range.contains(at))
    }

    /// Sum of covered spans, in nanoseconds.
    pub fn total_duration_nanos(&self) -> u128 {
        self.ranges.iter().map(Interval::duration_nanos).sum()
    }
}

impl<'a> IntoIterator for &'a ValidRangeSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

impl fmt::Display for ValidRangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ranges.is_empty() {
            return f.write_str("(empty)");
        }
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

/// Pairwise coalescing pass.
///
/// Each input absorbs every accepted interval it touches before being
/// accepted itself, so the accepted list stays disjoint after every step.
/// Quadratic in the input count, which is bounded by the credentials across
/// one request's chains.
fn coalesce(inputs: impl IntoIterator<Item = Interval>) -> Vec<Interval> {
    let mut accepted: Vec<Interval> = Vec::new();
    for interval in inputs {
        let mut candidate = interval;
        accepted.retain(|existing| {
            if existing.touches(&candidate) {
                candidate.merge(existing);
                false
            } else {
                true
            }
        });
        accepted.push(candidate);
    }
    accepted.sort_by_key(Interval::start);
    accepted
}
