//! One-pass tableau search
//!
//! The solver runs a depth-first search over [`Frame`]s kept on an explicit
//! stack. Each iteration expands the top frame to a fixpoint (contradiction,
//! conjunction and always sweeps, one branching rule at a time), then tries
//! to close the branch against an earlier instant (LOOP/REP), and otherwise
//! advances time (STEP). Backtracking pops to the most recent frame that
//! still has an untried alternative: a CHOICE frame whose other branch has
//! not run, or a SAT frame whose embedded solver can produce another
//! assignment.
//!
//! # Rule priority
//!
//! contradiction > conjunction > always > disjunction (when the SAT bridge
//! is off) > eventually > until > not-until > SAT branch > LOOP/REP > STEP.
//!
//! # Verdicts
//!
//! [`Verdict::Satisfiable`] pauses the search so the caller can extract the
//! lasso model and, by calling [`Solver::solution`] again, resume as if the
//! branch had failed to enumerate further models.
//! [`Verdict::Undefined`] means every open branch was cut by the depth bound
//! before a conclusion; it is a result, not an error.

use crate::bitset::FormulaSet;
use crate::closure::{Closure, ClosureOutcome, FormulaId};
use crate::frame::{Frame, FrameId, FrameType, SatState};
use crate::model::{Literal as ModelLiteral, Model, State};
use crate::options::SolverOptions;
use ltl_core::{simplify, Formula};
use ltl_sat::{LBool, Literal, Variable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

/// Outcome of a [`Solver::solution`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Satisfiable,
    Unsatisfiable,
    /// The depth bound cut every remaining branch; no conclusion.
    Undefined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchState {
    Initialized,
    Running,
    /// A SAT verdict was delivered; the next `solution()` call resumes by
    /// rolling back the latest choice.
    Paused,
    Done,
}

/// Which of the branching rules to try next.
#[derive(Debug, Clone, Copy)]
enum Branching {
    Disjunction,
    Eventually,
    Until,
    NotUntil,
}

/// What the LOOP/REP lookback concluded.
enum Lookback {
    /// Close the lasso at the given ancestor.
    Accept(FrameId),
    /// Same labeling seen twice without progress; prune (REP rule).
    Reject,
    Continue,
}

/// The tableau solver.
pub struct Solver {
    /// `None` when the input simplified to a constant.
    closure: Option<Box<Closure>>,
    trivial: Option<bool>,
    options: SolverOptions,
    stack: Vec<Frame>,
    state: SearchState,
    result: Verdict,
    loop_state: FrameId,
    rng: ChaCha8Rng,
    /// Scratch bitset shared by every rule (never concurrently).
    temp: FormulaSet,
    has_eventually: bool,
    has_until: bool,
    has_not_until: bool,
    /// Whether the depth bound pruned any branch since the last verdict.
    depth_cutoff: bool,
}

impl Solver {
    /// Build a solver for `formula`. The formula is simplified here; the
    /// caller does not need to normalize it first.
    pub fn new(formula: &Formula, options: SolverOptions) -> Solver {
        let options = options.clamped();
        let rng = match options.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let simplified = simplify(formula);
        debug!(%simplified, "solver initialized");

        match Closure::build(&simplified) {
            ClosureOutcome::Trivial(value) => Solver {
                closure: None,
                trivial: Some(value),
                options,
                stack: Vec::new(),
                state: SearchState::Initialized,
                result: Verdict::Undefined,
                loop_state: FrameId(0),
                rng,
                temp: FormulaSet::new(0),
                has_eventually: false,
                has_until: false,
                has_not_until: false,
                depth_cutoff: false,
            },
            ClosureOutcome::Closure(closure) => {
                let stack = vec![Frame::initial(
                    closure.start(),
                    closure.len(),
                    closure.eventuality_count(),
                )];
                let temp = FormulaSet::new(closure.len());
                let has_eventually = closure.kinds.eventually.any();
                let has_until = closure.kinds.until.any();
                let has_not_until = closure.kinds.not_until.any();
                Solver {
                    closure: Some(closure),
                    trivial: None,
                    options,
                    stack,
                    state: SearchState::Initialized,
                    result: Verdict::Undefined,
                    loop_state: FrameId(0),
                    rng,
                    temp,
                    has_eventually,
                    has_until,
                    has_not_until,
                    depth_cutoff: false,
                }
            }
        }
    }

    /// The most recent verdict.
    pub fn verdict(&self) -> Verdict {
        self.result
    }

    /// Run the search until the next verdict.
    ///
    /// Returns `Satisfiable` and pauses when a model is found (read it with
    /// [`Solver::model`]); calling `solution()` again resumes the search for
    /// the next model. Once the search space is exhausted the verdict is
    /// `Unsatisfiable`, or `Undefined` if the depth bound cut branches.
    pub fn solution(&mut self) -> Verdict {
        match self.state {
            SearchState::Running | SearchState::Done => return self.result,
            SearchState::Initialized => {
                if let Some(value) = self.trivial {
                    self.result = if value {
                        self.state = SearchState::Paused;
                        Verdict::Satisfiable
                    } else {
                        self.state = SearchState::Done;
                        Verdict::Unsatisfiable
                    };
                    return self.result;
                }
            }
            SearchState::Paused => {
                self.result = Verdict::Undefined;
                self.depth_cutoff = false;
                self.rollback();
            }
        }
        self.state = SearchState::Running;

        'search: while !self.stack.is_empty() {
            // Expand the top frame to its fixpoint. Every forked child and
            // every rollback restarts the loop with a new top frame.
            loop {
                let empty_at = {
                    let top = self.top();
                    if top.formulas.none() {
                        Some(match top.chain {
                            Some(chain) => self.stack[chain].id,
                            None => FrameId(0),
                        })
                    } else {
                        None
                    }
                };
                if let Some(loop_id) = empty_at {
                    // Nothing is required at this instant: the branch is
                    // vacuously satisfiable, looping on its predecessor.
                    self.loop_state = loop_id;
                    self.result = Verdict::Satisfiable;
                    self.state = SearchState::Paused;
                    trace!(loop_state = loop_id.0, "empty frame, satisfiable");
                    return self.result;
                }

                if self.check_contradiction() {
                    trace!("contradiction");
                    self.rollback();
                    continue 'search;
                }

                let mut applied = false;
                if self.apply_conjunction() {
                    applied = true;
                }
                if self.apply_always() {
                    applied = true;
                }

                if !self.should_use_sat() && self.branch(Branching::Disjunction) {
                    continue 'search;
                }
                if self.has_eventually && self.branch(Branching::Eventually) {
                    continue 'search;
                }
                if self.has_until && self.branch(Branching::Until) {
                    continue 'search;
                }
                if self.has_not_until && self.branch(Branching::NotUntil) {
                    continue 'search;
                }

                if applied {
                    continue;
                }

                if self.should_use_sat() {
                    if self.enter_sat_branch() {
                        continue 'search;
                    }
                    self.rollback();
                    continue 'search;
                }

                break;
            }

            self.update_eventualities();

            // Occasional-lookback heuristic: at 100 the check always runs.
            if self.rng.gen_range(0..=100u32) <= self.options.lookback_probability {
                match self.lookback() {
                    Lookback::Accept(loop_id) => {
                        self.loop_state = loop_id;
                        self.result = Verdict::Satisfiable;
                        self.state = SearchState::Paused;
                        trace!(loop_state = loop_id.0, "loop rule, satisfiable");
                        return self.result;
                    }
                    Lookback::Reject => {
                        trace!("rep rule");
                        self.rollback();
                        continue 'search;
                    }
                    Lookback::Continue => {}
                }
            }

            if self.top().id.0 >= self.options.max_depth {
                self.depth_cutoff = true;
                self.rollback();
                continue 'search;
            }

            self.apply_step();
        }

        self.state = SearchState::Done;
        if self.result == Verdict::Undefined && !self.depth_cutoff {
            self.result = Verdict::Unsatisfiable;
        }
        self.result
    }

    /// The lasso model of the last `Satisfiable` verdict.
    pub fn model(&self) -> Option<Model> {
        if self.state != SearchState::Paused || self.result != Verdict::Satisfiable {
            return None;
        }

        if self.trivial == Some(true) {
            return Some(Model {
                states: vec![[ModelLiteral::positive("⊤")].into_iter().collect()],
                loop_state: 0,
            });
        }

        let closure = self.closure.as_deref().expect("non-trivial solver has a closure");
        let mut states = Vec::new();
        for frame in &self.stack {
            if matches!(frame.ty, FrameType::Choice | FrameType::Sat) {
                continue;
            }
            let mut state = State::default();
            for j in frame.formulas.ones() {
                if let Some(name) = closure.atom_name(FormulaId(j as u64)) {
                    state.insert(ModelLiteral::positive(name));
                } else if closure.kinds.negation.contains(j) {
                    if let Some(name) = closure.atom_name(closure.lhs[j]) {
                        state.insert(ModelLiteral::negative(name));
                    }
                }
            }
            states.push(state);
        }
        // The top frame duplicates the loop target by construction.
        states.pop();
        Some(Model {
            states,
            loop_state: self.loop_state.0,
        })
    }

    fn top(&self) -> &Frame {
        self.stack.last().expect("search stack is never empty here")
    }

    /// Rule 0: a formula and its negation in the same frame. Relies on
    /// `index(¬x) == index(x) + 1`.
    fn check_contradiction(&mut self) -> bool {
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last().expect("stack");
        self.temp.copy_from(&frame.formulas);
        self.temp.intersect_with(&closure.kinds.negation);
        self.temp.shift_down_one();
        self.temp.intersect_with(&frame.formulas);
        self.temp.any()
    }

    /// Rule 1: assert both children of every unexpanded conjunction.
    fn apply_conjunction(&mut self) -> bool {
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last_mut().expect("stack");
        self.temp.copy_from(&frame.formulas);
        self.temp.intersect_with(&closure.kinds.conjunction);
        self.temp.intersect_with(&frame.to_process);
        if self.temp.none() {
            return false;
        }
        for one in self.temp.ones() {
            frame.formulas.insert(closure.lhs[one].index());
            frame.formulas.insert(closure.rhs[one].index());
            frame.to_process.remove(one);
        }
        true
    }

    /// Rule 2: `□x` asserts `x` now and the pre-synthesized `○□x`.
    fn apply_always(&mut self) -> bool {
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last_mut().expect("stack");
        self.temp.copy_from(&frame.formulas);
        self.temp.intersect_with(&closure.kinds.always);
        self.temp.intersect_with(&frame.to_process);
        if self.temp.none() {
            return false;
        }
        for one in self.temp.ones() {
            frame.formulas.insert(closure.lhs[one].index());
            debug_assert!(
                closure.kinds.next.contains(one + 1) && closure.lhs[one + 1].index() == one
            );
            frame.formulas.insert(one + 1);
            frame.to_process.remove(one);
        }
        true
    }

    /// Rules 3-6: consume the lowest unexpanded formula of the given kind,
    /// mark the frame as a CHOICE, and push the first branch. Returns false
    /// when no such formula remains.
    fn branch(&mut self, rule: Branching) -> bool {
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last_mut().expect("stack");

        let mask = match rule {
            Branching::Disjunction => &closure.kinds.disjunction,
            Branching::Eventually => &closure.kinds.eventually,
            Branching::Until => &closure.kinds.until,
            Branching::NotUntil => &closure.kinds.not_until,
        };
        self.temp.copy_from(&frame.formulas);
        self.temp.intersect_with(mask);
        self.temp.intersect_with(&frame.to_process);
        let Some(one) = self.temp.first_set() else {
            return false;
        };

        frame.to_process.remove(one);
        frame.chosen = FormulaId(one as u64);
        frame.ty = FrameType::Choice;

        // Register promises before forking so both branches inherit them.
        match rule {
            Branching::Disjunction => {}
            Branching::Eventually => {
                let slot = closure.fw_eventualities[closure.lhs[one].index()];
                frame.eventualities[slot.index()].request();
            }
            Branching::Until => {
                let slot = closure.fw_eventualities[closure.rhs[one].index()];
                frame.eventualities[slot.index()].request();
            }
            // ¬(a U b) is a greatest fixpoint: deferring it forever is a
            // model, so ¬a is never owed. Only ¬b, asserted on every
            // unfolding, is registered.
            Branching::NotUntil => {
                let slot = closure.fw_eventualities[closure.rhs[one].index()];
                frame.eventualities[slot.index()].request();
            }
        }

        let mut child = frame.child();
        match rule {
            // Left disjunct first; rollback will try the right one.
            Branching::Disjunction => child.formulas.insert(closure.lhs[one].index()),
            // Fulfill the promise now; rollback defers it one instant.
            Branching::Eventually => child.formulas.insert(closure.lhs[one].index()),
            Branching::Until => child.formulas.insert(closure.rhs[one].index()),
            Branching::NotUntil => {
                child.formulas.insert(closure.lhs[one].index());
                child.formulas.insert(closure.rhs[one].index());
            }
        }
        self.stack.push(child);
        true
    }

    /// True when the SAT bridge is enabled and the frame still has
    /// unexpanded disjunctions.
    fn should_use_sat(&mut self) -> bool {
        if !self.options.use_sat {
            return false;
        }
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last().expect("stack");
        self.temp.copy_from(&frame.formulas);
        self.temp.intersect_with(&frame.to_process);
        self.temp.intersect_with(&closure.kinds.disjunction);
        self.temp.any()
    }

    /// Rule C7: load the frame's propositional content into an embedded SAT
    /// solver and materialize the first satisfying assignment as a child
    /// frame. Returns false when the instance is unsatisfiable outright.
    fn enter_sat_branch(&mut self) -> bool {
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last_mut().expect("stack");

        let mut solver = ltl_sat::Solver::new();
        for _ in 0..closure.len() {
            solver.new_var();
        }

        // atoms, nexts, negated atoms and disjunctions of this frame
        self.temp.copy_from(&closure.kinds.atom);
        self.temp.shift_up_one();
        self.temp.intersect_with(&closure.kinds.negation);
        self.temp.union_with(&closure.kinds.atom);
        self.temp.union_with(&closure.kinds.next);
        self.temp.union_with(&closure.kinds.disjunction);
        self.temp.intersect_with(&frame.formulas);

        let mut literals: Vec<Variable> = Vec::new();
        for one in self.temp.ones() {
            let clause = &closure.clauses[one];
            solver.add_clause(clause);
            literals.extend(clause.iter().map(|lit| lit.variable()));
            if closure.kinds.disjunction.contains(one) {
                frame.to_process.remove(one);
            }
        }
        literals.sort_unstable();
        literals.dedup();

        frame.sat = Some(SatState { solver, literals });
        match next_sat_model(closure, frame) {
            Some(child) => {
                frame.ty = FrameType::Sat;
                self.stack.push(child);
                true
            }
            None => {
                frame.sat = None;
                false
            }
        }
    }

    /// Mark every eventuality fulfilled by the current labeling.
    fn update_eventualities(&mut self) {
        let closure = self.closure.as_deref().expect("closure");
        let frame = self.stack.last_mut().expect("stack");
        for (slot, promise) in closure.bw_eventualities.iter().enumerate() {
            if frame.formulas.contains(promise.index()) {
                frame.eventualities[slot].set_satisfied(frame.id);
            }
        }
    }

    /// LOOP and REP rules: walk the chain of earlier STEP frames, newest
    /// first, looking for an ancestor that subsumes the current labeling.
    fn lookback(&mut self) -> Lookback {
        // Partial-lookback heuristic: a non-zero draw bounds how far back
        // the walk goes. The default 0/0 draw disables the bound.
        let percentage = self
            .rng
            .gen_range(self.options.lookback_min..=self.options.lookback_max);

        let top = self.stack.last().expect("stack");
        let Some(head) = top.chain else {
            return Lookback::Continue;
        };
        let min_frame = (percentage as f64 / 100.0 * self.stack[head].id.0 as f64) as u64;

        let mut repetitions = 0;
        let mut cursor = Some(head);
        while let Some(index) = cursor {
            let candidate = &self.stack[index];
            if candidate.id.0 < min_frame {
                break;
            }
            if top.formulas.is_subset_of(&candidate.formulas) {
                let mut all_satisfied = true;
                for ev in &top.eventualities {
                    if ev.is_not_requested() {
                        continue;
                    }
                    match ev.satisfied_at() {
                        Some(id) if id >= candidate.id => {}
                        _ => {
                            all_satisfied = false;
                            break;
                        }
                    }
                }
                if all_satisfied {
                    return Lookback::Accept(candidate.id);
                }
                if top.formulas == candidate.formulas {
                    repetitions += 1;
                }
            }
            cursor = candidate.chain;
        }
        // Only once the whole chain has been walked: an accepting ancestor
        // further back would have won (its id bound is weaker).
        if repetitions >= 2 {
            Lookback::Reject
        } else {
            Lookback::Continue
        }
    }

    /// Rule 7: advance time, carrying every `○`-child into a fresh frame.
    fn apply_step(&mut self) {
        let closure = self.closure.as_deref().expect("closure");
        let top_index = self.stack.len() - 1;
        let frame = &mut self.stack[top_index];

        self.temp.copy_from(&frame.formulas);
        self.temp.intersect_with(&closure.kinds.next);

        let mut next = frame.step(top_index, closure.len());
        for one in self.temp.ones() {
            next.formulas.insert(closure.lhs[one].index());
        }
        frame.ty = FrameType::Step;
        self.stack.push(next);
    }

    /// Pop frames until a CHOICE with an untried alternate or a SAT frame
    /// with another model is found, and push that branch. An exhausted stack
    /// means the search space is done.
    fn rollback(&mut self) {
        while let Some(top_index) = self.stack.len().checked_sub(1) {
            let (ty, chosen) = {
                let top = &self.stack[top_index];
                (top.ty, top.chosen)
            };

            if ty == FrameType::Choice && !chosen.is_none() {
                let closure = self.closure.as_deref().expect("closure");
                let i = chosen.index();
                let top = &mut self.stack[top_index];
                let mut alt = top.child();

                if closure.kinds.disjunction.contains(i) {
                    alt.formulas.insert(closure.rhs[i].index());
                } else if closure.kinds.eventually.contains(i) {
                    debug_assert!(
                        closure.kinds.next.contains(i + 1)
                            && closure.lhs[i + 1].index() == i
                    );
                    alt.formulas.insert(i + 1);
                } else if closure.kinds.until.contains(i) {
                    alt.formulas.insert(closure.lhs[i].index());
                    alt.formulas.insert(closure.deferred_next(i));
                } else if closure.kinds.not_until.contains(i) {
                    alt.formulas.insert(closure.rhs[i].index());
                    alt.formulas.insert(closure.deferred_next(i));
                } else {
                    unreachable!("choice recorded on a non-branching formula");
                }

                top.chosen = FormulaId::NONE;
                self.stack.push(alt);
                return;
            }

            if ty == FrameType::Sat {
                let closure = self.closure.as_deref().expect("closure");
                let top = &mut self.stack[top_index];
                if let Some(child) = next_sat_model(closure, top) {
                    self.stack.push(child);
                    return;
                }
            }

            self.stack.pop();
        }
    }
}

/// Ask a SAT frame's solver for its next assignment; materialize it as a
/// child frame and block it from recurring.
///
/// A variable assigned true asserts its formula in the child. A variable
/// assigned false asserts the negated form one slot above it, when the
/// closure has one (`¬x` above `x`, `○¬x` above `○x`). The blocking clause
/// is the negation of the extracted assignment over the tracked variables.
fn next_sat_model(closure: &Closure, frame: &mut Frame) -> Option<Frame> {
    if !frame.sat.as_mut()?.solver.solve() {
        return None;
    }

    let mut child = frame.child();
    let sat = frame.sat.as_mut().expect("sat state present");
    let mut blocking: Vec<Literal> = Vec::with_capacity(sat.literals.len());
    for &var in &sat.literals {
        let id = var.index();
        if sat.solver.model_value(Literal::positive(var)) == LBool::True {
            blocking.push(Literal::negative(var));
            child.formulas.insert(id);
        } else if closure.is_negated_form(id + 1) {
            blocking.push(Literal::positive(var));
            child.formulas.insert(id + 1);
        }
    }
    sat.solver.add_clause(&blocking);
    Some(child)
}
