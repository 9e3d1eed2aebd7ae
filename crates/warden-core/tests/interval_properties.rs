//! Interval algebra property tests
//!
//! Checks the canonical-form guarantees of valid-range sets:
//! - Disjointness: compressed ranges never overlap or abut
//! - Union correctness: compression covers exactly the input instants
//! - Idempotence: compressing a compressed set is a no-op
//! - `overlaps` is symmetric

use proptest::prelude::*;
use warden_core::{Interval, IntervalSet, Timestamp, ValidRangeSet};

/// Small timeline so that overlaps and gaps are both common.
fn arb_interval() -> impl Strategy<Value = Interval> {
    (0i64..500, 0i64..60).prop_map(|(start, len)| {
        Interval::new(Timestamp::from_nanos(start), Timestamp::from_nanos(start + len))
            .expect("len is non-negative")
    })
}

fn arb_intervals() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec(arb_interval(), 0..40)
}

fn covered_by_inputs(inputs: &[Interval], at: Timestamp) -> bool {
    inputs.iter().any(|iv| iv.contains(at))
}

fn assert_canonical(set: &ValidRangeSet) -> Result<(), TestCaseError> {
    for pair in set.as_slice().windows(2) {
        prop_assert!(pair[0].start() <= pair[1].start(), "ranges must be sorted");
        prop_assert!(!pair[0].touches(&pair[1]), "ranges {} and {} touch", pair[0], pair[1]);
    }
    Ok(())
}

proptest! {
    #[test]
    fn compress_is_disjoint(inputs in arb_intervals()) {
        let set: IntervalSet = inputs.into_iter().collect();
        assert_canonical(&set.compress())?;
    }

    #[test]
    fn compress_preserves_union(inputs in arb_intervals()) {
        let set: IntervalSet = inputs.iter().copied().collect();
        let compressed = set.compress();
        for t in -1i64..=561 {
            let at = Timestamp::from_nanos(t);
            prop_assert_eq!(compressed.contains(at), covered_by_inputs(&inputs, at), "instant {}", t);
        }
    }

    #[test]
    fn compress_is_idempotent(inputs in arb_intervals()) {
        let once = inputs.into_iter().collect::<IntervalSet>().compress();
        let twice = IntervalSet::from(once.clone()).compress();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merge_from_matches_joint_compression(a in arb_intervals(), b in arb_intervals()) {
        let mut merged = a.iter().copied().collect::<IntervalSet>().compress();
        merged.merge_from(&b.iter().copied().collect::<IntervalSet>().compress());
        assert_canonical(&merged)?;

        let joint = a.into_iter().chain(b).collect::<IntervalSet>().compress();
        prop_assert_eq!(merged, joint);
    }

    #[test]
    fn merge_from_is_order_independent(a in arb_intervals(), b in arb_intervals()) {
        let set_a = a.into_iter().collect::<IntervalSet>().compress();
        let set_b = b.into_iter().collect::<IntervalSet>().compress();

        let mut ab = set_a.clone();
        ab.merge_from(&set_b);
        let mut ba = set_b;
        ba.merge_from(&set_a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn overlaps_is_symmetric(a in arb_interval(), b in arb_interval()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        prop_assert_eq!(a.touches(&b), b.touches(&a));
    }
}
