//! ltl-check - one-pass tableau LTL satisfiability
//!
//! This crate provides:
//! - **Closure construction**: dense indexing of every formula the tableau
//!   can assert, laid out so that rule application is constant-time
//! - **Frames**: bitset-labeled tableau nodes on an explicit DFS stack
//! - **Rule engine and search driver**: expansion rules, LOOP/REP
//!   termination, rollback with alternate-branch replay
//! - **SAT bridge**: optional batching of propositional branching through an
//!   embedded solver
//! - **Model extraction**: lasso-shaped witnesses for satisfiable formulas
//!
//! # Quick start
//!
//! ```rust
//! use ltl_check::{solve, SolverOptions, Verdict};
//! use ltl_core::parse;
//!
//! let formula = parse("G(request -> F grant)").unwrap();
//! let (verdict, model) = solve(&formula, SolverOptions::default());
//! assert_eq!(verdict, Verdict::Satisfiable);
//! println!("{}", model.unwrap());
//! ```

pub mod bitset;
pub mod closure;
pub mod frame;
pub mod model;
pub mod options;
pub mod solver;

pub use bitset::FormulaSet;
pub use closure::{Closure, FormulaId};
pub use frame::{Eventuality, Frame, FrameId, FrameType};
pub use model::{Literal, Model, State};
pub use options::SolverOptions;
pub use solver::{Solver, Verdict};

/// Decide satisfiability of `formula` and return the verdict together with
/// a witnessing model when there is one.
pub fn solve(formula: &ltl_core::Formula, options: SolverOptions) -> (Verdict, Option<Model>) {
    let mut solver = Solver::new(formula, options);
    let verdict = solver.solution();
    let model = solver.model();
    (verdict, model)
}
