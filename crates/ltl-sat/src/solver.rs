//! DPLL SAT solver
//!
//! A deliberately small solver for the tableau's per-frame propositional
//! instances: two-watched-literal unit propagation, chronological
//! backtracking over a decision stack, saved phases. Clauses may be added
//! between `solve()` calls, which is how the tableau enumerates frame
//! assignments (solve, block the model, solve again).
//!
//! Instances here are tiny (one variable per closure formula), so there is
//! no conflict learning, no restarts, no heuristics beyond first-unassigned
//! branching. Completeness and determinism are what matter.

use crate::literal::{LBool, Literal, Variable};

#[derive(Debug, Clone, Copy)]
struct Decision {
    lit: Literal,
    /// True once this decision has been tried in both polarities
    flipped: bool,
    /// Trail length when the decision was made
    trail_start: usize,
}

/// The SAT solver
#[derive(Debug, Default)]
pub struct Solver {
    /// Clause database; positions 0 and 1 of each clause are watched
    clauses: Vec<Vec<Literal>>,
    /// Watch lists indexed by `Literal::index`
    watches: Vec<Vec<usize>>,
    /// Current assignment, indexed by variable
    assignment: Vec<LBool>,
    /// Saved polarity per variable, used as decision phase
    phase: Vec<bool>,
    /// Assignment of the most recent satisfying `solve()`
    model: Vec<LBool>,
    /// Assigned literals in order
    trail: Vec<Literal>,
    /// Decision stack
    decisions: Vec<Decision>,
    /// Propagation queue head (index into trail)
    qhead: usize,
    /// False once the clause set is known unsatisfiable
    ok: bool,
}

impl Solver {
    pub fn new() -> Solver {
        Solver {
            ok: true,
            ..Solver::default()
        }
    }

    /// Number of variables created so far.
    pub fn num_vars(&self) -> usize {
        self.assignment.len()
    }

    /// Create a fresh variable.
    pub fn new_var(&mut self) -> Variable {
        let var = Variable(self.assignment.len() as u32);
        self.assignment.push(LBool::Undef);
        self.phase.push(false);
        self.watches.push(Vec::new());
        self.watches.push(Vec::new());
        var
    }

    /// Add a clause. Returns false once the clause set has become trivially
    /// unsatisfiable (empty clause, or conflicting units).
    ///
    /// Must be called outside of search, i.e. before the first `solve()` or
    /// between `solve()` calls; the solver is then at its root level.
    pub fn add_clause(&mut self, lits: &[Literal]) -> bool {
        if !self.ok {
            return false;
        }
        debug_assert!(self.decisions.is_empty());

        let mut clause: Vec<Literal> = lits.to_vec();
        clause.sort_unstable();
        clause.dedup();

        // Tautologies vanish; root-false literals are dropped, a root-true
        // literal satisfies the clause outright.
        let mut filtered = Vec::with_capacity(clause.len());
        for (i, &lit) in clause.iter().enumerate() {
            if i + 1 < clause.len() && clause[i + 1] == lit.negated() {
                return true;
            }
            match self.value(lit) {
                LBool::True => return true,
                LBool::False => {}
                LBool::Undef => filtered.push(lit),
            }
        }

        match filtered.len() {
            0 => {
                self.ok = false;
                false
            }
            1 => {
                self.enqueue(filtered[0]);
                true
            }
            _ => {
                let index = self.clauses.len();
                self.watches[filtered[0].index()].push(index);
                self.watches[filtered[1].index()].push(index);
                self.clauses.push(filtered);
                true
            }
        }
    }

    /// Search for a satisfying assignment. On success the model is saved
    /// (query it with [`Solver::model_value`]) and the solver returns to its
    /// root level, ready for more clauses.
    pub fn solve(&mut self) -> bool {
        if !self.ok {
            return false;
        }
        // Re-propagate from scratch: clauses and units may have been added
        // since the previous call.
        self.qhead = 0;

        loop {
            if self.propagate().is_some() {
                if !self.backtrack() {
                    self.ok = false;
                    return false;
                }
            } else {
                match self.pick_branch_var() {
                    None => {
                        self.save_model();
                        self.cancel_to_root();
                        return true;
                    }
                    Some(var) => {
                        let lit = if self.phase[var.index()] {
                            Literal::positive(var)
                        } else {
                            Literal::negative(var)
                        };
                        self.decisions.push(Decision {
                            lit,
                            flipped: false,
                            trail_start: self.trail.len(),
                        });
                        self.enqueue(lit);
                    }
                }
            }
        }
    }

    /// Value of a literal in the most recent model.
    pub fn model_value(&self, lit: Literal) -> LBool {
        match self.model.get(lit.variable().index()) {
            Some(&value) if lit.is_positive() => value,
            Some(&value) => !value,
            None => LBool::Undef,
        }
    }

    fn value(&self, lit: Literal) -> LBool {
        let value = self.assignment[lit.variable().index()];
        if lit.is_positive() {
            value
        } else {
            !value
        }
    }

    fn enqueue(&mut self, lit: Literal) {
        debug_assert_eq!(self.value(lit), LBool::Undef);
        self.assignment[lit.variable().index()] = if lit.is_positive() {
            LBool::True
        } else {
            LBool::False
        };
        self.trail.push(lit);
    }

    /// Undo trail entries down to `len` and reset the propagation queue.
    fn unwind_to(&mut self, len: usize) {
        while self.trail.len() > len {
            let lit = self.trail.pop().expect("trail entry");
            self.assignment[lit.variable().index()] = LBool::Undef;
        }
        self.qhead = len;
    }

    fn cancel_to_root(&mut self) {
        while let Some(decision) = self.decisions.pop() {
            self.unwind_to(decision.trail_start);
        }
    }

    /// Flip the most recent unflipped decision. Returns false when every
    /// decision has been tried both ways: the instance is unsatisfiable.
    fn backtrack(&mut self) -> bool {
        while let Some(decision) = self.decisions.pop() {
            self.unwind_to(decision.trail_start);
            if !decision.flipped {
                let lit = decision.lit.negated();
                self.decisions.push(Decision {
                    lit,
                    flipped: true,
                    trail_start: self.trail.len(),
                });
                self.enqueue(lit);
                return true;
            }
        }
        false
    }

    fn pick_branch_var(&self) -> Option<Variable> {
        self.assignment
            .iter()
            .position(|&v| v == LBool::Undef)
            .map(|i| Variable(i as u32))
    }

    fn save_model(&mut self) {
        self.model = self.assignment.clone();
        for (saved, value) in self.phase.iter_mut().zip(&self.model) {
            *saved = *value == LBool::True;
        }
    }

    /// Unit propagation. Returns the index of a conflicting clause, if any.
    fn propagate(&mut self) -> Option<usize> {
        while self.qhead < self.trail.len() {
            let lit = self.trail[self.qhead];
            self.qhead += 1;
            let false_lit = lit.negated();

            let mut watch_list = std::mem::take(&mut self.watches[false_lit.index()]);
            let mut i = 0;
            while i < watch_list.len() {
                let ci = watch_list[i];
                let clause = &mut self.clauses[ci];

                // Keep the falsified literal at position 1.
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }
                debug_assert_eq!(clause[1], false_lit);

                let first = clause[0];
                if lit_value(&self.assignment, first) == LBool::True {
                    i += 1;
                    continue;
                }

                // Look for a non-false replacement watch.
                let replacement = (2..clause.len())
                    .find(|&k| lit_value(&self.assignment, clause[k]) != LBool::False);
                if let Some(k) = replacement {
                    clause.swap(1, k);
                    let new_watch = clause[1];
                    self.watches[new_watch.index()].push(ci);
                    watch_list.swap_remove(i);
                    continue;
                }

                if lit_value(&self.assignment, first) == LBool::False {
                    // Conflict: put the watch list back untouched.
                    self.watches[false_lit.index()] = watch_list;
                    return Some(ci);
                }
                self.enqueue(first);
                i += 1;
            }
            self.watches[false_lit.index()] = watch_list;
        }
        None
    }
}

fn lit_value(assignment: &[LBool], lit: Literal) -> LBool {
    let value = assignment[lit.variable().index()];
    if lit.is_positive() {
        value
    } else {
        !value
    }
}
