//! LTL formula AST and canonical ordering
//!
//! The AST is an immutable tree of reference-counted nodes. Syntactically
//! identical subtrees compare equal structurally; `Arc` sharing keeps clones
//! cheap and gives a pointer-equality fast path during comparison.
//!
//! The canonical order defined by [`canonical_cmp`] is what the tableau
//! engine sorts the closure by. Its one load-bearing property: a negation
//! sorts immediately after its operand, and `○x` sorts immediately after `x`
//! (with `¬x` before `○x` when both occur). The closure indexing tricks
//! (`index(¬x) == index(x) + 1`, synthesized `○□x` at `index(□x) + 1`, …)
//! all fall out of this order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// An LTL formula.
///
/// `Implies` and `Iff` are produced by the parser and eliminated by
/// [`simplify`](crate::simplify::simplify); the solver only ever sees the
/// remaining kinds, with `Not` restricted to atoms and `Until`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    True,
    False,
    Atom(Arc<str>),
    Not(Arc<Formula>),
    Next(Arc<Formula>),
    Always(Arc<Formula>),
    Eventually(Arc<Formula>),
    And(Arc<Formula>, Arc<Formula>),
    Or(Arc<Formula>, Arc<Formula>),
    Until(Arc<Formula>, Arc<Formula>),
    Implies(Arc<Formula>, Arc<Formula>),
    Iff(Arc<Formula>, Arc<Formula>),
}

impl Formula {
    pub fn atom(name: impl Into<Arc<str>>) -> Formula {
        Formula::Atom(name.into())
    }

    pub fn not(f: Formula) -> Formula {
        Formula::Not(Arc::new(f))
    }

    pub fn next(f: Formula) -> Formula {
        Formula::Next(Arc::new(f))
    }

    pub fn always(f: Formula) -> Formula {
        Formula::Always(Arc::new(f))
    }

    pub fn eventually(f: Formula) -> Formula {
        Formula::Eventually(Arc::new(f))
    }

    pub fn and(a: Formula, b: Formula) -> Formula {
        Formula::And(Arc::new(a), Arc::new(b))
    }

    pub fn or(a: Formula, b: Formula) -> Formula {
        Formula::Or(Arc::new(a), Arc::new(b))
    }

    pub fn until(a: Formula, b: Formula) -> Formula {
        Formula::Until(Arc::new(a), Arc::new(b))
    }

    pub fn implies(a: Formula, b: Formula) -> Formula {
        Formula::Implies(Arc::new(a), Arc::new(b))
    }

    pub fn iff(a: Formula, b: Formula) -> Formula {
        Formula::Iff(Arc::new(a), Arc::new(b))
    }

    /// Stable small-integer tag, the cross-kind tie-break of the canonical
    /// order.
    pub fn type_tag(&self) -> u8 {
        match self {
            Formula::True => 0,
            Formula::False => 1,
            Formula::Atom(_) => 2,
            Formula::Not(_) => 3,
            Formula::Next(_) => 4,
            Formula::Always(_) => 5,
            Formula::Eventually(_) => 6,
            Formula::And(..) => 7,
            Formula::Or(..) => 8,
            Formula::Until(..) => 9,
            Formula::Implies(..) => 10,
            Formula::Iff(..) => 11,
        }
    }

    /// True if the formula is an atom.
    pub fn is_atom(&self) -> bool {
        matches!(self, Formula::Atom(_))
    }
}

/// The canonical total order on formulas.
///
/// - atoms: lexicographic by name;
/// - `¬x` against `y`: equal operand means `¬x` sorts just after `x`,
///   otherwise `¬x` compares as its operand does;
/// - `○x` behaves the same way, and `¬x < ○x` when both are present;
/// - unary temporal operators compare by operand, binary operators by left
///   child then right child;
/// - anything else falls back to the [`Formula::type_tag`].
///
/// Returns `Equal` exactly for structurally equal formulas.
pub fn canonical_cmp(a: &Formula, b: &Formula) -> Ordering {
    use Formula::*;

    match (a, b) {
        (Atom(x), Atom(y)) => x.cmp(y),

        (Not(x), Not(y)) => canonical_cmp(x, y),
        (Not(x), _) => {
            if **x == *b {
                Ordering::Greater
            } else {
                canonical_cmp(x, b)
            }
        }
        (_, Not(y)) => {
            if *a == **y {
                Ordering::Less
            } else {
                canonical_cmp(a, y)
            }
        }

        (Next(x), Next(y)) => canonical_cmp(x, y),
        (Next(x), _) => {
            if **x == *b {
                Ordering::Greater
            } else {
                canonical_cmp(x, b)
            }
        }
        (_, Next(y)) => {
            if *a == **y {
                Ordering::Less
            } else {
                canonical_cmp(a, y)
            }
        }

        (Always(x), Always(y)) => canonical_cmp(x, y),
        (Eventually(x), Eventually(y)) => canonical_cmp(x, y),

        (And(al, ar), And(bl, br))
        | (Or(al, ar), Or(bl, br))
        | (Until(al, ar), Until(bl, br))
        | (Implies(al, ar), Implies(bl, br))
        | (Iff(al, ar), Iff(bl, br)) => {
            canonical_cmp(al, bl).then_with(|| canonical_cmp(ar, br))
        }

        _ => a.type_tag().cmp(&b.type_tag()),
    }
}

// Printing precedence, loosest binding first.
fn precedence(f: &Formula) -> u8 {
    match f {
        Formula::Iff(..) => 1,
        Formula::Implies(..) => 2,
        Formula::Or(..) => 3,
        Formula::And(..) => 4,
        Formula::Until(..) => 5,
        Formula::Not(_) | Formula::Next(_) | Formula::Always(_) | Formula::Eventually(_) => 6,
        Formula::True | Formula::False | Formula::Atom(_) => 7,
    }
}

fn fmt_child(f: &Formula, parent_prec: u8, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    if precedence(f) <= parent_prec {
        write!(out, "({f})")
    } else {
        write!(out, "{f}")
    }
}

fn fmt_binary(
    op: &str,
    prec: u8,
    l: &Formula,
    r: &Formula,
    out: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    // Right associative chains print without parentheses on the right.
    fmt_child(l, prec, out)?;
    write!(out, " {op} ")?;
    if precedence(r) < prec {
        write!(out, "({r})")
    } else {
        write!(out, "{r}")
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(out, "true"),
            Formula::False => write!(out, "false"),
            Formula::Atom(name) => write!(out, "{name}"),
            Formula::Not(x) => {
                write!(out, "¬")?;
                fmt_child(x, 6, out)
            }
            Formula::Next(x) => {
                write!(out, "○")?;
                fmt_child(x, 6, out)
            }
            Formula::Always(x) => {
                write!(out, "□")?;
                fmt_child(x, 6, out)
            }
            Formula::Eventually(x) => {
                write!(out, "◇")?;
                fmt_child(x, 6, out)
            }
            Formula::And(a, b) => fmt_binary("∧", 4, a, b, out),
            Formula::Or(a, b) => fmt_binary("∨", 3, a, b, out),
            Formula::Until(a, b) => fmt_binary("U", 5, a, b, out),
            Formula::Implies(a, b) => fmt_binary("→", 2, a, b, out),
            Formula::Iff(a, b) => fmt_binary("↔", 1, a, b, out),
        }
    }
}
