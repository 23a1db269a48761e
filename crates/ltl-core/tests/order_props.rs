//! Property tests for the canonical formula order
//!
//! The closure builder sorts by this order and then leans on adjacency
//! (`¬x` right after `x`, synthesized `○` right after its operand), so the
//! order must be a genuine total order on simplified formulas.

use ltl_core::{canonical_cmp, simplify, Formula};
use proptest::prelude::*;
use std::cmp::Ordering;

fn arb_formula() -> impl Strategy<Value = Formula> {
    let leaf = prop_oneof![
        Just(Formula::atom("p")),
        Just(Formula::atom("q")),
        Just(Formula::atom("r")),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            inner.clone().prop_map(Formula::next),
            inner.clone().prop_map(Formula::always),
            inner.clone().prop_map(Formula::eventually),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::and(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::or(a, b)),
            (inner.clone(), inner).prop_map(|(a, b)| Formula::until(a, b)),
        ]
    })
}

// Simplified formulas: the domain the solver actually sorts.
fn arb_simplified() -> impl Strategy<Value = Formula> {
    arb_formula().prop_map(|f| simplify(&f))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_reflexive(a in arb_simplified()) {
        prop_assert_eq!(canonical_cmp(&a, &a), Ordering::Equal);
    }

    #[test]
    fn prop_antisymmetric(a in arb_simplified(), b in arb_simplified()) {
        let ab = canonical_cmp(&a, &b);
        let ba = canonical_cmp(&b, &a);
        prop_assert_eq!(ab, ba.reverse());
        if ab == Ordering::Equal {
            prop_assert_eq!(&a, &b);
        }
    }

    #[test]
    fn prop_transitive(a in arb_simplified(), b in arb_simplified(), c in arb_simplified()) {
        let mut v = [a, b, c];
        v.sort_by(canonical_cmp);
        // A transitivity failure shows up as an unsorted result.
        prop_assert_ne!(canonical_cmp(&v[0], &v[1]), Ordering::Greater);
        prop_assert_ne!(canonical_cmp(&v[1], &v[2]), Ordering::Greater);
        prop_assert_ne!(canonical_cmp(&v[0], &v[2]), Ordering::Greater);
    }

    #[test]
    fn prop_negation_is_immediate_successor(f in arb_simplified()) {
        // No simplified formula sorts strictly between x and ¬x.
        let not_f = Formula::not(f.clone());
        prop_assert_eq!(canonical_cmp(&f, &not_f), Ordering::Less);
    }
}

#[test]
fn adjacency_is_tight() {
    // Nothing sorts between x and ¬x, or between x and ○x: any g comparing
    // greater than x also compares greater than ¬x and ○x (unless equal).
    let p = Formula::atom("p");
    let candidates = [
        Formula::atom("o"),
        Formula::atom("pq"),
        Formula::not(Formula::atom("o")),
        Formula::next(Formula::atom("q")),
        Formula::always(Formula::atom("p")),
        Formula::until(Formula::atom("a"), Formula::atom("p")),
    ];
    let np = Formula::not(p.clone());
    let xp = Formula::next(p.clone());
    for g in &candidates {
        let vs_p = canonical_cmp(g, &p);
        assert_eq!(canonical_cmp(g, &np), vs_p, "{g} splits p and ¬p");
        assert_eq!(canonical_cmp(g, &xp), vs_p, "{g} splits p and ○p");
    }
}
