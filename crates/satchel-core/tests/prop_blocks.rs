//! Property-based tests for the interval algebra using proptest.
//!
//! The block-list invariant (sorted, non-overlapping, touching merged) is
//! what makes intersection and subtraction correct, so these properties
//! are checked over arbitrary inputs rather than hand-picked examples.

use proptest::prelude::*;
use satchel_core::block::{apply_buffer, intersect, normalize, normalize_raw, subtract, TimeBlock};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Raw minute pairs as they might arrive from storage: some inverted,
/// some degenerate, some stretching past the end of the day.
fn arb_raw_pairs() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec(
        (0i64..1440, -30i64..300).prop_map(|(start, len)| (start, start + len)),
        0..12,
    )
}

fn arb_blocks() -> impl Strategy<Value = Vec<TimeBlock>> {
    arb_raw_pairs().prop_map(|pairs| normalize_raw(&pairs))
}

fn arb_buffer() -> impl Strategy<Value = u16> {
    0u16..=240
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Sorted, strictly gapped (touching blocks would have been merged).
fn is_normalized(blocks: &[TimeBlock]) -> bool {
    blocks.windows(2).all(|w| w[0].end() < w[1].start())
}

/// Every block of `inner` sits wholly inside some block of `outer`.
fn contained_in(inner: &[TimeBlock], outer: &[TimeBlock]) -> bool {
    inner.iter().all(|b| outer.iter().any(|o| o.contains(b)))
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: normalize is idempotent and always yields normal form
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn normalize_is_idempotent(pairs in arb_raw_pairs()) {
        let once = normalize_raw(&pairs);
        prop_assert!(is_normalized(&once), "not normalized: {:?}", once);

        let twice = normalize(once.clone());
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Property 2: intersect commutes
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn intersect_commutes(a in arb_blocks(), b in arb_blocks()) {
        prop_assert_eq!(intersect(&a, &b), intersect(&b, &a));
    }
}

// ---------------------------------------------------------------------------
// Property 3: intersect output is normalized without a second pass and is
// contained in both operands
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn intersect_output_normalized_and_contained(a in arb_blocks(), b in arb_blocks()) {
        let out = intersect(&a, &b);
        prop_assert!(is_normalized(&out), "not normalized: {:?}", out);
        prop_assert_eq!(normalize(out.clone()), out.clone());
        prop_assert!(contained_in(&out, &a), "{:?} escapes {:?}", out, a);
        prop_assert!(contained_in(&out, &b), "{:?} escapes {:?}", out, b);
    }
}

// ---------------------------------------------------------------------------
// Property 4: subtracting a list from itself leaves nothing
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn subtract_self_is_empty(a in arb_blocks()) {
        prop_assert!(subtract(&a, &a).is_empty());
    }
}

// ---------------------------------------------------------------------------
// Property 5: subtraction stays inside the base and clear of the cut
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn subtract_contained_and_disjoint(a in arb_blocks(), b in arb_blocks()) {
        let out = subtract(&a, &b);
        prop_assert!(is_normalized(&out), "not normalized: {:?}", out);
        prop_assert!(contained_in(&out, &a), "{:?} escapes {:?}", out, a);
        prop_assert!(intersect(&out, &b).is_empty(), "{:?} still meets {:?}", out, b);
    }
}

// ---------------------------------------------------------------------------
// Property 6: subtracting nothing changes nothing
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn subtract_empty_is_identity(a in arb_blocks()) {
        prop_assert_eq!(subtract(&a, &[]), a);
    }
}

// ---------------------------------------------------------------------------
// Property 7: buffering only ever extends coverage, capped at midnight
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn buffer_never_shrinks_coverage(a in arb_blocks(), buffer in arb_buffer()) {
        let buffered = apply_buffer(a.clone(), buffer);
        prop_assert!(is_normalized(&buffered), "not normalized: {:?}", buffered);
        prop_assert!(
            contained_in(&a, &buffered),
            "{:?} lost coverage of {:?}",
            buffered,
            a
        );
        for block in &buffered {
            prop_assert!(block.end() <= 1440);
        }
    }
}
