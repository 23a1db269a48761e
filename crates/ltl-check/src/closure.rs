//! Closure construction
//!
//! The closure of a formula is the set of every subformula the tableau can
//! ever assert, sorted by the canonical order and indexed densely. Beyond
//! plain subformulas it contains:
//!
//! - for each `¬(a U b)`, the simplified negations `¬a` and `¬b` (not-until
//!   is a primitive operator whose children are those negations; the walk
//!   does not descend into the positive `a U b`);
//! - for each `□x`, `◇x`, `a U b` and `¬(a U b)`, the synthesized `○`-form
//!   used to defer the obligation one instant.
//!
//! The canonical order makes the layout the rule engine relies on:
//! `index(¬x) == index(x) + 1`, the synthesized `○□x` / `○◇x` immediately
//! follow `□x` / `◇x`, and the deferred `○` of an until variant sits at most
//! two slots above it.
//!
//! Construction also precomputes the eventuality lookup tables and the SAT
//! clause templates used by the optional propositional bridge.

use crate::bitset::FormulaSet;
use ltl_core::{canonical_cmp, simplify, Formula};
use ltl_sat::{Literal, Variable};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Dense index of a formula in the closure. `FormulaId::NONE` means "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormulaId(pub u64);

impl FormulaId {
    pub const NONE: FormulaId = FormulaId(u64::MAX);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_none(self) -> bool {
        self == FormulaId::NONE
    }
}

/// Per-kind membership bitsets over the closure.
#[derive(Debug, Clone)]
pub(crate) struct KindSets {
    pub atom: FormulaSet,
    pub negation: FormulaSet,
    pub next: FormulaSet,
    pub always: FormulaSet,
    pub eventually: FormulaSet,
    pub conjunction: FormulaSet,
    pub disjunction: FormulaSet,
    pub until: FormulaSet,
    pub not_until: FormulaSet,
}

impl KindSets {
    fn new(len: usize) -> KindSets {
        KindSets {
            atom: FormulaSet::new(len),
            negation: FormulaSet::new(len),
            next: FormulaSet::new(len),
            always: FormulaSet::new(len),
            eventually: FormulaSet::new(len),
            conjunction: FormulaSet::new(len),
            disjunction: FormulaSet::new(len),
            until: FormulaSet::new(len),
            not_until: FormulaSet::new(len),
        }
    }
}

/// Outcome of closure construction.
pub(crate) enum ClosureOutcome {
    /// The formula simplified to a constant; no search is needed.
    Trivial(bool),
    Closure(Box<Closure>),
}

/// The indexed closure of a formula.
#[derive(Debug, Clone)]
pub struct Closure {
    subformulas: Vec<Formula>,
    start: FormulaId,
    pub(crate) kinds: KindSets,
    pub(crate) lhs: Vec<FormulaId>,
    pub(crate) rhs: Vec<FormulaId>,
    atom_names: FxHashMap<FormulaId, Arc<str>>,
    /// Formula index → eventuality slot (or NONE)
    pub(crate) fw_eventualities: Vec<FormulaId>,
    /// Eventuality slot → formula index
    pub(crate) bw_eventualities: Vec<FormulaId>,
    /// SAT clause templates, one per closure entry (empty for conjunctions)
    pub(crate) clauses: Vec<Vec<Literal>>,
}

impl Closure {
    /// Build the closure of a simplified formula.
    pub(crate) fn build(formula: &Formula) -> ClosureOutcome {
        match formula {
            Formula::True => return ClosureOutcome::Trivial(true),
            Formula::False => return ClosureOutcome::Trivial(false),
            _ => {}
        }

        let mut subformulas = Vec::new();
        collect(formula, &mut subformulas);
        subformulas.sort_by(canonical_cmp);
        subformulas.dedup();

        let n = subformulas.len();
        debug!(subformulas = n, "closure built");

        let mut closure = Closure {
            start: position(&subformulas, formula),
            kinds: KindSets::new(n),
            lhs: vec![FormulaId::NONE; n],
            rhs: vec![FormulaId::NONE; n],
            atom_names: FxHashMap::default(),
            fw_eventualities: vec![FormulaId::NONE; n],
            bw_eventualities: Vec::new(),
            clauses: Vec::with_capacity(n),
            subformulas,
        };
        closure.index_entries();
        closure.index_eventualities();
        closure.build_clause_templates();

        debug!(
            eventualities = closure.bw_eventualities.len(),
            start = closure.start.0,
            "closure indexed"
        );
        ClosureOutcome::Closure(Box::new(closure))
    }

    /// Number of closure entries.
    pub fn len(&self) -> usize {
        self.subformulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subformulas.is_empty()
    }

    /// Index of the input formula.
    pub fn start(&self) -> FormulaId {
        self.start
    }

    /// The closure entries in canonical order.
    pub fn subformulas(&self) -> &[Formula] {
        &self.subformulas
    }

    /// Atom name of an entry, if it is an atom.
    pub fn atom_name(&self, id: FormulaId) -> Option<&str> {
        self.atom_names.get(&id).map(|name| &**name)
    }

    pub(crate) fn eventuality_count(&self) -> usize {
        self.bw_eventualities.len()
    }

    /// True when entry `j` is a negated form sitting one slot above its
    /// positive counterpart: a plain negation, or a `○¬x`. The SAT bridge
    /// uses this to assert the negated entry when a variable comes back
    /// false.
    pub(crate) fn is_negated_form(&self, j: usize) -> bool {
        if j >= self.len() {
            return false;
        }
        self.kinds.negation.contains(j)
            || (self.kinds.next.contains(j)
                && matches!(&self.subformulas[j], Formula::Next(x) if matches!(&**x, Formula::Not(_))))
    }

    /// Index of the deferred `○` form of the until variant at `i`.
    ///
    /// The canonical order puts it at `i + 1`, unless the opposite-polarity
    /// until sits in between (mixed-polarity closures), in which case it is
    /// at `i + 2`. The `lhs` check picks the right one.
    pub(crate) fn deferred_next(&self, i: usize) -> usize {
        for j in [i + 1, i + 2] {
            if j < self.len() && self.kinds.next.contains(j) && self.lhs[j].index() == i {
                return j;
            }
        }
        unreachable!("closure contains the deferred ○ within two slots of {i}")
    }

    fn index_entries(&mut self) {
        for i in 0..self.subformulas.len() {
            let f = self.subformulas[i].clone();
            let id = FormulaId(i as u64);
            match &f {
                Formula::Atom(name) => {
                    self.kinds.atom.insert(i);
                    self.atom_names.insert(id, name.clone());
                }
                Formula::Not(x) => match &**x {
                    Formula::Until(a, b) => {
                        self.kinds.not_until.insert(i);
                        self.lhs[i] = self.position(&simplify(&Formula::not((**a).clone())));
                        self.rhs[i] = self.position(&simplify(&Formula::not((**b).clone())));
                    }
                    _ => {
                        self.kinds.negation.insert(i);
                        self.lhs[i] = self.position(x);
                    }
                },
                Formula::Next(x) => {
                    self.kinds.next.insert(i);
                    self.lhs[i] = self.position(x);
                }
                Formula::Always(x) => {
                    self.kinds.always.insert(i);
                    self.lhs[i] = self.position(x);
                }
                Formula::Eventually(x) => {
                    self.kinds.eventually.insert(i);
                    self.lhs[i] = self.position(x);
                }
                Formula::And(a, b) => {
                    self.kinds.conjunction.insert(i);
                    self.lhs[i] = self.position(a);
                    self.rhs[i] = self.position(b);
                }
                Formula::Or(a, b) => {
                    self.kinds.disjunction.insert(i);
                    self.lhs[i] = self.position(a);
                    self.rhs[i] = self.position(b);
                }
                Formula::Until(a, b) => {
                    self.kinds.until.insert(i);
                    self.lhs[i] = self.position(a);
                    self.rhs[i] = self.position(b);
                }
                Formula::True
                | Formula::False
                | Formula::Implies(..)
                | Formula::Iff(..) => {
                    unreachable!("constants and implications are removed before closure construction")
                }
            }
        }
    }

    /// An eventuality is the promise of a temporal obligation: `x` for
    /// `◇x`, `b` for `a U b`, and the negated children for `¬(a U b)`.
    fn index_eventualities(&mut self) {
        let mut promises: Vec<u64> = Vec::new();
        for i in 0..self.len() {
            if self.kinds.eventually.contains(i) {
                promises.push(self.lhs[i].0);
            } else if self.kinds.until.contains(i) {
                promises.push(self.rhs[i].0);
            } else if self.kinds.not_until.contains(i) {
                promises.push(self.lhs[i].0);
                promises.push(self.rhs[i].0);
            }
        }
        promises.sort_unstable();
        promises.dedup();

        self.bw_eventualities = promises.iter().map(|&p| FormulaId(p)).collect();
        for (slot, &promise) in promises.iter().enumerate() {
            self.fw_eventualities[promise as usize] = FormulaId(slot as u64);
        }
    }

    /// One clause template per entry, encoding it over one SAT variable per
    /// closure index. A negation (or a `○¬x`) is expressed as the negative
    /// literal of the entry one below it; a disjunction flattens its or-tree
    /// into sign-aware leaf literals. Conjunctions need no clause: the
    /// conjunction rule has already asserted both children by the time the
    /// bridge runs.
    fn build_clause_templates(&mut self) {
        for i in 0..self.len() {
            let clause = if self.kinds.atom.contains(i)
                || self.kinds.always.contains(i)
                || self.kinds.eventually.contains(i)
                || self.kinds.until.contains(i)
            {
                vec![Literal::positive(Variable(i as u32))]
            } else if self.kinds.negation.contains(i) || self.kinds.not_until.contains(i) {
                vec![Literal::negative(Variable(i as u32 - 1))]
            } else if self.kinds.next.contains(i) {
                if matches!(&self.subformulas[i], Formula::Next(x) if matches!(&**x, Formula::Not(_)))
                {
                    vec![Literal::negative(Variable(i as u32 - 1))]
                } else {
                    vec![Literal::positive(Variable(i as u32))]
                }
            } else if self.kinds.disjunction.contains(i) {
                let mut leaves = Vec::new();
                self.collect_or_leaves(&self.subformulas[i].clone(), &mut leaves);
                leaves
            } else {
                Vec::new()
            };
            self.clauses.push(clause);
        }
    }

    fn collect_or_leaves(&self, f: &Formula, out: &mut Vec<Literal>) {
        let Formula::Or(a, b) = f else {
            let i = self.position(f).index();
            let negated = matches!(f, Formula::Not(_))
                || matches!(f, Formula::Next(x) if matches!(&**x, Formula::Not(_)));
            out.push(if negated {
                Literal::negative(Variable(i as u32 - 1))
            } else {
                Literal::positive(Variable(i as u32))
            });
            return;
        };
        self.collect_or_leaves(a, out);
        self.collect_or_leaves(b, out);
    }

    fn position(&self, f: &Formula) -> FormulaId {
        position(&self.subformulas, f)
    }
}

fn position(subformulas: &[Formula], f: &Formula) -> FormulaId {
    let index = subformulas
        .binary_search_by(|entry| canonical_cmp(entry, f))
        .expect("closure is subformula-closed");
    FormulaId(index as u64)
}

/// Emit `f` and everything the tableau may derive from it.
fn collect(f: &Formula, out: &mut Vec<Formula>) {
    out.push(f.clone());
    match f {
        Formula::True | Formula::False | Formula::Atom(_) => {}
        Formula::Not(x) => match &**x {
            Formula::Until(a, b) => {
                collect(&simplify(&Formula::not((**a).clone())), out);
                collect(&simplify(&Formula::not((**b).clone())), out);
                out.push(Formula::next(f.clone()));
            }
            _ => collect(x, out),
        },
        Formula::Next(x) => collect(x, out),
        Formula::Always(x) | Formula::Eventually(x) => {
            collect(x, out);
            out.push(Formula::next(f.clone()));
        }
        Formula::And(a, b) | Formula::Or(a, b) => {
            collect(a, out);
            collect(b, out);
        }
        Formula::Until(a, b) => {
            collect(a, out);
            collect(b, out);
            out.push(Formula::next(f.clone()));
        }
        Formula::Implies(..) | Formula::Iff(..) => {
            unreachable!("implications are removed before closure construction")
        }
    }
}
