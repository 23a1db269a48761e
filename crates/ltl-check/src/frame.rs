//! Tableau frames
//!
//! A frame is one node of the one-pass tableau: a propositional labeling of
//! a single time instant plus the bookkeeping the search needs (what is
//! still unexpanded, which promises are outstanding, where the previous
//! instant sits on the stack).
//!
//! Frames live on the search driver's explicit stack and are value-cloned on
//! every fork. The `chain` back-reference to the previous STEP frame is a
//! stack index, never a pointer, so it cannot outlive the stack.

use crate::bitset::FormulaSet;
use crate::closure::FormulaId;
use ltl_sat::{Solver, Variable};

/// Tableau depth, incremented once per STEP (one per time instant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

/// Rôle of a frame in the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Still being expanded
    Unknown,
    /// Forked on a disjunction/eventually/until/not-until; holds an
    /// alternate branch until `chosen` is consumed
    Choice,
    /// Advanced time; its `○`-children were carried to the next frame
    Step,
    /// Enumerating propositional assignments through the embedded solver
    Sat,
}

/// Satisfaction state of one eventuality on the current branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eventuality {
    /// No commitment created yet
    NotRequested,
    /// Promised but not yet fulfilled
    NotSatisfied,
    /// Fulfilled at the given frame (latest fulfilling frame wins)
    Satisfied(FrameId),
}

impl Eventuality {
    pub fn is_not_requested(self) -> bool {
        self == Eventuality::NotRequested
    }

    /// Turn an unrequested promise into an outstanding one.
    pub fn request(&mut self) {
        if *self == Eventuality::NotRequested {
            *self = Eventuality::NotSatisfied;
        }
    }

    pub fn set_satisfied(&mut self, id: FrameId) {
        *self = Eventuality::Satisfied(id);
    }

    /// The frame that fulfilled the promise, if any.
    pub fn satisfied_at(self) -> Option<FrameId> {
        match self {
            Eventuality::Satisfied(id) => Some(id),
            _ => None,
        }
    }
}

/// SAT-frame state: the embedded solver plus the variables it tracks.
#[derive(Debug)]
pub struct SatState {
    pub solver: Solver,
    /// Variables whose clauses were loaded, deduplicated and sorted
    pub literals: Vec<Variable>,
}

/// One tableau node.
#[derive(Debug)]
pub struct Frame {
    pub id: FrameId,
    /// Formulas asserted at this instant
    pub formulas: FormulaSet,
    /// Expansion mask: a formula is expandable while its bit is still set.
    /// Initialized full and only ever cleared, so formulas asserted later in
    /// the frame's life are still expandable; rules always read it
    /// intersected with `formulas`.
    pub to_process: FormulaSet,
    /// Per-eventuality satisfaction state, one slot per closure eventuality
    pub eventualities: Vec<Eventuality>,
    pub ty: FrameType,
    /// The formula a CHOICE frame split on; `NONE` once the alternate branch
    /// has been taken
    pub chosen: FormulaId,
    /// Stack index of the previous STEP frame
    pub chain: Option<usize>,
    /// Embedded solver handle, SAT frames only
    pub sat: Option<SatState>,
}

impl Frame {
    /// The root frame: only the start formula is asserted.
    pub fn initial(start: FormulaId, closure_len: usize, eventuality_count: usize) -> Frame {
        let mut formulas = FormulaSet::new(closure_len);
        formulas.insert(start.index());
        let mut to_process = FormulaSet::new(closure_len);
        to_process.fill();
        Frame {
            id: FrameId(0),
            formulas,
            to_process,
            eventualities: vec![Eventuality::NotRequested; eventuality_count],
            ty: FrameType::Unknown,
            chosen: FormulaId::NONE,
            chain: None,
            sat: None,
        }
    }

    /// A fork of this frame: same labeling, fresh rôle, no solver handle.
    pub fn child(&self) -> Frame {
        Frame {
            id: self.id,
            formulas: self.formulas.clone(),
            to_process: self.to_process.clone(),
            eventualities: self.eventualities.clone(),
            ty: FrameType::Unknown,
            chosen: FormulaId::NONE,
            chain: self.chain,
            sat: None,
        }
    }

    /// The successor instant: empty labeling, full expansion mask, inherited
    /// eventualities, chained to the stepping frame.
    pub fn step(&self, own_index: usize, closure_len: usize) -> Frame {
        let mut to_process = FormulaSet::new(closure_len);
        to_process.fill();
        Frame {
            id: FrameId(self.id.0 + 1),
            formulas: FormulaSet::new(closure_len),
            to_process,
            eventualities: self.eventualities.clone(),
            ty: FrameType::Unknown,
            chosen: FormulaId::NONE,
            chain: Some(own_index),
            sat: None,
        }
    }
}
