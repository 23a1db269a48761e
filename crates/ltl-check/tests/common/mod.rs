//! Shared test support: evaluate an LTL formula over a lasso model.
//!
//! A model is a finite prefix plus a loop-back index, so satisfaction is
//! decidable by fixpoint iteration over the finite state graph: each
//! position has the single successor `i + 1`, wrapping from the last state
//! to `loop_state`. Least fixpoints evaluate `◇`/`U`, greatest fixpoints
//! evaluate `□`. Atoms a state does not mention are taken as false, which is
//! one of the completions the model stands for.

use ltl_check::Model;
use ltl_core::Formula;
use std::collections::HashSet;

/// True when `model` is a genuine witness for `formula`.
pub fn lasso_satisfies(formula: &Formula, model: &Model) -> bool {
    assert!(!model.states.is_empty(), "empty model");
    let loop_index = model.loop_state as usize;
    assert!(loop_index < model.states.len(), "loop index out of range");

    let states: Vec<HashSet<String>> = model
        .states
        .iter()
        .map(|state| {
            state
                .iter()
                .filter(|literal| literal.positive)
                .map(|literal| literal.atom.clone())
                .collect()
        })
        .collect();

    eval(formula, &states, loop_index)[0]
}

fn eval(f: &Formula, states: &[HashSet<String>], loop_index: usize) -> Vec<bool> {
    let k = states.len();
    let succ = |i: usize| if i + 1 < k { i + 1 } else { loop_index };

    match f {
        Formula::True => vec![true; k],
        Formula::False => vec![false; k],
        Formula::Atom(name) => states.iter().map(|s| s.contains(name.as_ref())).collect(),
        Formula::Not(x) => eval(x, states, loop_index).iter().map(|v| !v).collect(),
        Formula::And(a, b) => zip_with(f2(a, b, states, loop_index), |x, y| x && y),
        Formula::Or(a, b) => zip_with(f2(a, b, states, loop_index), |x, y| x || y),
        Formula::Implies(a, b) => zip_with(f2(a, b, states, loop_index), |x, y| !x || y),
        Formula::Iff(a, b) => zip_with(f2(a, b, states, loop_index), |x, y| x == y),
        Formula::Next(x) => {
            let vx = eval(x, states, loop_index);
            (0..k).map(|i| vx[succ(i)]).collect()
        }
        Formula::Always(x) => {
            // Greatest fixpoint of v[i] = x[i] ∧ v[succ(i)]
            let vx = eval(x, states, loop_index);
            let mut current = vec![true; k];
            loop {
                let next: Vec<bool> = (0..k).map(|i| vx[i] && current[succ(i)]).collect();
                if next == current {
                    return current;
                }
                current = next;
            }
        }
        Formula::Eventually(x) => {
            // Least fixpoint of v[i] = x[i] ∨ v[succ(i)]
            let vx = eval(x, states, loop_index);
            let mut current = vec![false; k];
            loop {
                let next: Vec<bool> = (0..k).map(|i| vx[i] || current[succ(i)]).collect();
                if next == current {
                    return current;
                }
                current = next;
            }
        }
        Formula::Until(a, b) => {
            // Least fixpoint of v[i] = b[i] ∨ (a[i] ∧ v[succ(i)])
            let va = eval(a, states, loop_index);
            let vb = eval(b, states, loop_index);
            let mut current = vec![false; k];
            loop {
                let next: Vec<bool> = (0..k)
                    .map(|i| vb[i] || (va[i] && current[succ(i)]))
                    .collect();
                if next == current {
                    return current;
                }
                current = next;
            }
        }
    }
}

fn f2(
    a: &Formula,
    b: &Formula,
    states: &[HashSet<String>],
    loop_index: usize,
) -> (Vec<bool>, Vec<bool>) {
    (eval(a, states, loop_index), eval(b, states, loop_index))
}

fn zip_with((va, vb): (Vec<bool>, Vec<bool>), op: impl Fn(bool, bool) -> bool) -> Vec<bool> {
    va.into_iter().zip(vb).map(|(x, y)| op(x, y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ltl_check::{Literal, State};
    use ltl_core::parse;

    fn model(states: &[&[(&str, bool)]], loop_state: u64) -> Model {
        Model {
            states: states
                .iter()
                .map(|literals| {
                    literals
                        .iter()
                        .map(|&(atom, positive)| Literal {
                            atom: atom.to_string(),
                            positive,
                        })
                        .collect::<State>()
                })
                .collect(),
            loop_state,
        }
    }

    #[test]
    fn evaluates_propositional_operators() {
        let m = model(&[&[("p", true)]], 0);
        assert!(lasso_satisfies(&parse("p").unwrap(), &m));
        assert!(!lasso_satisfies(&parse("q").unwrap(), &m));
        assert!(lasso_satisfies(&parse("p | q").unwrap(), &m));
        assert!(!lasso_satisfies(&parse("p & q").unwrap(), &m));
        assert!(lasso_satisfies(&parse("q -> p").unwrap(), &m));
    }

    #[test]
    fn evaluates_temporal_operators_on_loops() {
        // p ¬p (q)^ω
        let m = model(&[&[("p", true)], &[("p", false)], &[("q", true)]], 2);
        assert!(lasso_satisfies(&parse("p").unwrap(), &m));
        assert!(lasso_satisfies(&parse("X !p").unwrap(), &m));
        assert!(lasso_satisfies(&parse("F q").unwrap(), &m));
        assert!(lasso_satisfies(&parse("F G q").unwrap(), &m));
        assert!(!lasso_satisfies(&parse("G q").unwrap(), &m));
        assert!(!lasso_satisfies(&parse("G F p").unwrap(), &m));
    }

    #[test]
    fn until_requires_the_promise() {
        // (p)^ω : p U q fails, p U p holds
        let m = model(&[&[("p", true)]], 0);
        assert!(!lasso_satisfies(&parse("p U q").unwrap(), &m));
        assert!(lasso_satisfies(&parse("p U p").unwrap(), &m));

        // p p q (r)^ω
        let m = model(
            &[&[("p", true)], &[("p", true)], &[("q", true)], &[("r", true)]],
            3,
        );
        assert!(lasso_satisfies(&parse("p U q").unwrap(), &m));
        assert!(!lasso_satisfies(&parse("q U p").unwrap(), &m));
    }

    #[test]
    fn not_until_on_loops() {
        // (p)^ω satisfies ¬(q U r) and ¬(p U q)
        let m = model(&[&[("p", true)]], 0);
        assert!(lasso_satisfies(&parse("!(q U r)").unwrap(), &m));
        assert!(lasso_satisfies(&parse("!(p U q)").unwrap(), &m));
        assert!(!lasso_satisfies(&parse("!(p U p)").unwrap(), &m));
    }
}
