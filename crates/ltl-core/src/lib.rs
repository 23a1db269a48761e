//! ltl-core - LTL formula language
//!
//! This crate provides:
//! - **Formula AST**: immutable, `Arc`-shared LTL formula trees
//! - **Canonical ordering**: the total order the tableau closure is indexed by
//! - **Parser**: Unicode/ASCII formula syntax built on `logos`
//! - **Simplifier**: normalization to the solver operator set
//!
//! # Quick start
//!
//! ```rust
//! use ltl_core::{parse, simplify};
//!
//! let f = parse("p -> <>q").unwrap();
//! let normal = simplify(&f);
//! assert_eq!(normal.to_string(), "¬p ∨ ◇q");
//! ```

pub mod formula;
pub mod simplify;
pub mod syntax;

pub use formula::{canonical_cmp, Formula};
pub use simplify::simplify;
pub use syntax::parser::{parse, ParseError};
