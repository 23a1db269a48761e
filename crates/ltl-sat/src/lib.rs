//! ltl-sat - embedded SAT solver
//!
//! A minimal, dependency-free CNF solver used by the tableau engine to batch
//! propositional branching decisions inside a single frame. The interface is
//! the classic incremental one: create variables, add clauses, solve, read
//! the model, add a blocking clause, solve again.
//!
//! ```rust
//! use ltl_sat::{LBool, Literal, Solver};
//!
//! let mut solver = Solver::new();
//! let a = solver.new_var();
//! let b = solver.new_var();
//! solver.add_clause(&[Literal::positive(a), Literal::positive(b)]);
//! solver.add_clause(&[Literal::negative(a)]);
//! assert!(solver.solve());
//! assert_eq!(solver.model_value(Literal::positive(b)), LBool::True);
//! ```

pub mod literal;
pub mod solver;

pub use literal::{LBool, Literal, Variable};
pub use solver::Solver;
