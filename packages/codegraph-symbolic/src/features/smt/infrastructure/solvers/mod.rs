//! Solver backends
//!
//! A backend decides one `Problem` at a time. Backends are pooled and reused
//! across calls, so `check` takes `&mut self` and must leave no state behind
//! that changes the next answer.

use crate::features::smt::domain::{Problem, SolveOutcome, SolverError};
use crate::shared::Deadline;

pub mod difference;
pub mod eval;
pub mod interval;
mod search;

pub use search::IntervalSolver;

/// Decision procedure behind the adapter
pub trait SolverBackend: Send {
    /// Name of this backend
    fn name(&self) -> &'static str;

    /// Decide satisfiability of the conjunction of `problem.assertions`.
    ///
    /// `Unsat` must only be returned with a proof; an incomplete search that
    /// fails to find a model answers `Unknown`.
    fn check(&mut self, problem: &Problem, deadline: &Deadline) -> Result<SolveOutcome, SolverError>;
}
