//! Solver configuration

/// Tunables for the tableau search.
///
/// The percentage fields are clamped into `[0, 100]` (and `lookback_min ≤
/// lookback_max`) when the solver is built; out-of-range values are a
/// configuration mistake, not an error.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum tableau depth (number of STEP frames) before a branch is
    /// treated as a dead end.
    pub max_depth: u64,
    /// Batch propositional branching through the embedded SAT solver.
    pub use_sat: bool,
    /// Probability, in percent, that the LOOP/REP lookback runs at each
    /// fixpoint. At 100 (the default) the check always runs and the solver
    /// is complete; below 100 the solver may report UNSAT on satisfiable
    /// inputs.
    pub lookback_probability: u32,
    /// Lower bound, in percent, for the partial-lookback draw. With
    /// `lookback_min`/`lookback_max` at their `0/0` defaults the chain walk
    /// is unbounded.
    pub lookback_min: u32,
    /// Upper bound, in percent, for the partial-lookback draw. A non-zero
    /// draw stops the walk before the oldest frames, trading completeness
    /// for speed.
    pub lookback_max: u32,
    /// RNG seed for the heuristic draws. A fixed seed makes the search
    /// fully deterministic; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SolverOptions {
    fn default() -> SolverOptions {
        SolverOptions {
            max_depth: 64,
            use_sat: false,
            lookback_probability: 100,
            lookback_min: 0,
            lookback_max: 0,
            seed: None,
        }
    }
}

impl SolverOptions {
    /// Silently clamp percentages into range and order min/max.
    pub(crate) fn clamped(mut self) -> SolverOptions {
        self.lookback_probability = self.lookback_probability.min(100);
        self.lookback_max = self.lookback_max.min(100);
        self.lookback_min = self.lookback_min.min(self.lookback_max);
        self
    }
}
