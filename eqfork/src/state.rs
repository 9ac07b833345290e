//! Miscellaneous solver state.
use crate::solver::Contradiction;

/// Progress of the solver.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolveState {
    /// `solve` was not called yet, variables can be declared and set.
    Unsolved,
    Solved,
    /// `solve` failed, e.g. because every branch turned out inconsistent.
    Failed,
}

impl Default for SolveState {
    fn default() -> SolveState {
        SolveState::Unsolved
    }
}

/// Miscellaneous solver state.
#[derive(Default)]
pub struct SolverState {
    pub solve_state: SolveState,
    /// Set once the initial branch was split.
    pub split: bool,
    /// Why branches were deleted, in deletion order.
    pub contradictions: Vec<Contradiction>,
}

impl SolverState {
    /// Whether declarations and external assignments are forbidden.
    pub fn is_locked(&self) -> bool {
        self.solve_state != SolveState::Unsolved || self.split
    }
}
