//! Lasso-shaped models
//!
//! A satisfiable verdict comes with a finite witness: a prefix of states and
//! a loop-back index. The infinite trace is
//! `s_0 … s_{ℓ-1} (s_ℓ … s_{k-1})^ω`. Each state is the set of literals the
//! accepting branch asserted at that instant; atoms a state does not mention
//! are unconstrained.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// An atom or its negation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Literal {
    pub atom: String,
    pub positive: bool,
}

impl Literal {
    pub fn positive(atom: impl Into<String>) -> Literal {
        Literal {
            atom: atom.into(),
            positive: true,
        }
    }

    pub fn negative(atom: impl Into<String>) -> Literal {
        Literal {
            atom: atom.into(),
            positive: false,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.positive {
            write!(out, "{}", self.atom)
        } else {
            write!(out, "¬{}", self.atom)
        }
    }
}

/// The literal labeling of one time instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct State(pub BTreeSet<Literal>);

impl State {
    pub fn insert(&mut self, literal: Literal) {
        self.0.insert(literal);
    }

    pub fn contains(&self, literal: &Literal) -> bool {
        self.0.contains(literal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Literal> for State {
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> State {
        State(iter.into_iter().collect())
    }
}

impl fmt::Display for State {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "{{")?;
        for (i, literal) in self.0.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            write!(out, "{literal}")?;
        }
        write!(out, "}}")
    }
}

/// A finite prefix plus loop-back index, denoting an ultimately periodic
/// trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    pub states: Vec<State>,
    /// Index of the state the trace loops back to
    pub loop_state: u64,
}

impl fmt::Display for Model {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loop_index = self.loop_state as usize;
        for (i, state) in self.states.iter().enumerate() {
            if i > 0 {
                write!(out, " ")?;
            }
            if i == loop_index {
                write!(out, "( ")?;
            }
            write!(out, "{state}")?;
        }
        write!(out, " )ω")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_display() {
        assert_eq!(Literal::positive("p").to_string(), "p");
        assert_eq!(Literal::negative("p").to_string(), "¬p");
    }

    #[test]
    fn model_display_marks_loop() {
        let model = Model {
            states: vec![
                [Literal::positive("p")].into_iter().collect(),
                [Literal::positive("q"), Literal::negative("p")]
                    .into_iter()
                    .collect(),
            ],
            loop_state: 1,
        };
        assert_eq!(model.to_string(), "{p} ( {¬p, q} )ω");
    }

    #[test]
    fn model_serializes() {
        let model = Model {
            states: vec![[Literal::positive("p")].into_iter().collect()],
            loop_state: 0,
        };
        let json = serde_json::to_value(&model).expect("serialize");
        assert_eq!(json["loop_state"], 0);
        assert_eq!(json["states"][0][0]["atom"], "p");
        assert_eq!(json["states"][0][0]["positive"], true);
    }
}
