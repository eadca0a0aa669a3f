//! SMT use case

use crate::features::smt::domain::SolveOutcome;
use crate::features::smt::infrastructure::{AdapterStats, SolverAdapter};
use crate::features::symbolic::domain::SymbolicPath;
use crate::shared::Deadline;

/// Path feasibility queries, as seen by the explorer
pub trait SolverUseCase {
    fn solve(&mut self, path: &SymbolicPath, deadline: &Deadline) -> SolveOutcome;

    /// No backend could be obtained for this call
    fn is_degraded(&self) -> bool;

    fn stats(&self) -> AdapterStats;
}

impl SolverUseCase for SolverAdapter {
    fn solve(&mut self, path: &SymbolicPath, deadline: &Deadline) -> SolveOutcome {
        SolverAdapter::solve(self, path, deadline)
    }

    fn is_degraded(&self) -> bool {
        SolverAdapter::is_degraded(self)
    }

    fn stats(&self) -> AdapterStats {
        SolverAdapter::stats(self).clone()
    }
}
