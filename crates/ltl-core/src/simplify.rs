//! Formula normalization
//!
//! [`simplify`] rewrites a parsed formula into the operator set the tableau
//! engine works on: `→` and `↔` are eliminated, double negations removed,
//! negation pushed inward across every operator except `U` (not-until is
//! primitive for the solver), and boolean constants folded away. After
//! simplification, `¬` only ever appears in front of an atom or an `U`, and
//! `true`/`false` can only survive as the whole formula.
//!
//! The function is idempotent: `simplify(simplify(f)) == simplify(f)`.

use crate::formula::Formula;

/// Normalize a formula for the solver.
pub fn simplify(f: &Formula) -> Formula {
    match f {
        Formula::True | Formula::False | Formula::Atom(_) => f.clone(),

        Formula::Not(x) => negate(&simplify(x)),

        Formula::Next(x) => match simplify(x) {
            Formula::True => Formula::True,
            Formula::False => Formula::False,
            sx => Formula::next(sx),
        },

        Formula::Always(x) => match simplify(x) {
            Formula::True => Formula::True,
            Formula::False => Formula::False,
            sx => Formula::always(sx),
        },

        Formula::Eventually(x) => match simplify(x) {
            Formula::True => Formula::True,
            Formula::False => Formula::False,
            sx => Formula::eventually(sx),
        },

        Formula::And(a, b) => match (simplify(a), simplify(b)) {
            (Formula::False, _) | (_, Formula::False) => Formula::False,
            (Formula::True, sb) => sb,
            (sa, Formula::True) => sa,
            (sa, sb) => Formula::and(sa, sb),
        },

        Formula::Or(a, b) => match (simplify(a), simplify(b)) {
            (Formula::True, _) | (_, Formula::True) => Formula::True,
            (Formula::False, sb) => sb,
            (sa, Formula::False) => sa,
            (sa, sb) => Formula::or(sa, sb),
        },

        Formula::Until(a, b) => match (simplify(a), simplify(b)) {
            (_, Formula::True) => Formula::True,
            (_, Formula::False) => Formula::False,
            (Formula::False, sb) => sb,
            (Formula::True, sb) => Formula::eventually(sb),
            (sa, sb) => Formula::until(sa, sb),
        },

        Formula::Implies(a, b) => {
            simplify(&Formula::or(Formula::not((**a).clone()), (**b).clone()))
        }

        Formula::Iff(a, b) => simplify(&Formula::and(
            Formula::or(Formula::not((**a).clone()), (**b).clone()),
            Formula::or(Formula::not((**b).clone()), (**a).clone()),
        )),
    }
}

// Negation of an already-simplified formula, kept in normal form.
fn negate(f: &Formula) -> Formula {
    match f {
        Formula::True => Formula::False,
        Formula::False => Formula::True,
        Formula::Atom(_) => Formula::not(f.clone()),
        Formula::Not(x) => (**x).clone(),
        Formula::Next(x) => Formula::next(negate(x)),
        Formula::Always(x) => Formula::eventually(negate(x)),
        Formula::Eventually(x) => Formula::always(negate(x)),
        Formula::And(a, b) => Formula::or(negate(a), negate(b)),
        Formula::Or(a, b) => Formula::and(negate(a), negate(b)),
        Formula::Until(..) => Formula::not(f.clone()),
        // Not reachable from simplify(), but keeps negate total.
        Formula::Implies(..) | Formula::Iff(..) => negate(&simplify(f)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parser::parse;
    use proptest::prelude::*;

    fn s(src: &str) -> Formula {
        simplify(&parse(src).expect("parse"))
    }

    /// Check the solver-facing normal form: no `→`/`↔`, negation only on
    /// atoms and untils, constants nowhere below the root.
    fn assert_normal(f: &Formula) {
        fn walk(f: &Formula, root: bool) {
            match f {
                Formula::True | Formula::False => {
                    assert!(root, "constant below root in {f}")
                }
                Formula::Atom(_) => {}
                Formula::Not(x) => {
                    assert!(
                        matches!(**x, Formula::Atom(_) | Formula::Until(..)),
                        "negation of non-atom, non-until: {f}"
                    );
                    walk(x, false);
                }
                Formula::Next(x) | Formula::Always(x) | Formula::Eventually(x) => walk(x, false),
                Formula::And(a, b) | Formula::Or(a, b) | Formula::Until(a, b) => {
                    walk(a, false);
                    walk(b, false);
                }
                Formula::Implies(..) | Formula::Iff(..) => {
                    panic!("implication survived simplification: {f}")
                }
            }
        }
        walk(f, true)
    }

    #[test]
    fn eliminates_implication() {
        assert_eq!(s("p -> q"), s("!p | q"));
        assert_eq!(s("p <-> q"), s("(!p | q) & (!q | p)"));
    }

    #[test]
    fn removes_double_negation() {
        assert_eq!(s("!!p"), s("p"));
        assert_eq!(s("!!!p"), s("!p"));
    }

    #[test]
    fn pushes_negation_inward() {
        assert_eq!(s("!(p & q)"), s("!p | !q"));
        assert_eq!(s("!(p | q)"), s("!p & !q"));
        assert_eq!(s("!X p"), s("X !p"));
        assert_eq!(s("!G p"), s("F !p"));
        assert_eq!(s("!F p"), s("G !p"));
    }

    #[test]
    fn not_until_stays_primitive() {
        let f = s("!(p U q)");
        assert_eq!(
            f,
            Formula::not(Formula::until(Formula::atom("p"), Formula::atom("q")))
        );
    }

    #[test]
    fn folds_constants() {
        assert_eq!(s("p & true"), s("p"));
        assert_eq!(s("p & false"), Formula::False);
        assert_eq!(s("p | true"), Formula::True);
        assert_eq!(s("p | false"), s("p"));
        assert_eq!(s("X true"), Formula::True);
        assert_eq!(s("G false"), Formula::False);
        assert_eq!(s("p U true"), Formula::True);
        assert_eq!(s("p U false"), Formula::False);
        assert_eq!(s("false U p"), s("p"));
        assert_eq!(s("true U p"), s("F p"));
        assert_eq!(s("!true"), Formula::False);
        assert_eq!(s("p -> p | q"), Formula::or(
            Formula::not(Formula::atom("p")),
            Formula::or(Formula::atom("p"), Formula::atom("q")),
        ));
    }

    #[test]
    fn contradictions_are_kept_not_solved() {
        // The simplifier is purely syntactic: p ∧ ¬p is not its business.
        assert_eq!(
            s("p & !p"),
            Formula::and(Formula::atom("p"), Formula::not(Formula::atom("p")))
        );
    }

    // ========================================================================
    // Property tests
    // ========================================================================

    fn arb_formula() -> impl Strategy<Value = Formula> {
        let leaf = prop_oneof![
            Just(Formula::True),
            Just(Formula::False),
            Just(Formula::atom("p")),
            Just(Formula::atom("q")),
            Just(Formula::atom("r")),
        ];
        leaf.prop_recursive(4, 32, 2, |inner| {
            prop_oneof![
                inner.clone().prop_map(Formula::not),
                inner.clone().prop_map(Formula::next),
                inner.clone().prop_map(Formula::always),
                inner.clone().prop_map(Formula::eventually),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::and(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::or(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::until(a, b)),
                (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::implies(a, b)),
                (inner.clone(), inner).prop_map(|(a, b)| Formula::iff(a, b)),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_simplify_is_idempotent(f in arb_formula()) {
            let once = simplify(&f);
            let twice = simplify(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_simplify_normal_form(f in arb_formula()) {
            assert_normal(&simplify(&f));
        }

        #[test]
        fn prop_display_parse_simplify_roundtrip(f in arb_formula()) {
            let once = simplify(&f);
            let reparsed = parse(&once.to_string()).expect("printed formula parses");
            prop_assert_eq!(simplify(&reparsed), once);
        }
    }
}
