//! Result masking
//!
//! Applies a valid-range set to query results. Records outside every range
//! are dropped silently; that is the default-deny behavior, not an error.

use tracing::Span;
use warden_core::{Timestamped, ValidRangeSet};

/// Filters query results against valid-range sets.
#[derive(Debug, Clone)]
pub struct ResultMasker {
    span: Span,
}

impl Default for ResultMasker {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultMasker {
    /// Create a masker with its own component span.
    pub fn new() -> Self {
        Self {
            span: tracing::debug_span!("result_masker"),
        }
    }

    /// Emit events under `span` instead of the default component span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Sort `records` by timestamp, then mask them.
    ///
    /// Records sharing a timestamp keep their relative order.
    pub fn mask<R: Timestamped + Clone>(&self, ranges: &ValidRangeSet, mut records: Vec<R>) -> Vec<R> {
        sort_by_time(&mut records);
        self.mask_sorted(ranges, &records)
    }

    /// Keep the records of an ascending-sorted slice that fall inside `ranges`.
    ///
    /// Each range selects one contiguous slice by binary search; since the
    /// ranges are disjoint and ascending, the output is ascending and holds
    /// every kept record exactly once.
    pub fn mask_sorted<R: Timestamped + Clone>(&self, ranges: &ValidRangeSet, records: &[R]) -> Vec<R> {
        let mut kept = Vec::new();
        for range in ranges {
            let lo = records.partition_point(|r| r.timestamp() < range.start());
            let hi = records.partition_point(|r| r.timestamp() <= range.end());
            if lo < hi {
                kept.extend_from_slice(&records[lo..hi]);
            }
        }

        let dropped = records.len() - kept.len();
        if dropped > 0 {
            tracing::debug!(
                parent: &self.span,
                total = records.len(),
                kept = kept.len(),
                dropped,
                "Masked records outside valid ranges"
            );
        }
        kept
    }

    /// Metadata visibility is binary: a group is shown whole iff any range exists.
    pub fn keep_metadata(&self, ranges: &ValidRangeSet) -> bool {
        !ranges.is_empty()
    }
}

/// Stable ascending sort by timestamp.
pub fn sort_by_time<R: Timestamped>(records: &mut [R]) {
    records.sort_by_key(Timestamped::timestamp);
}
