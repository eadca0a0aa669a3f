//! Constraint solving
//!
//! ```text
//! smt
//! ├── domain/          # Term language, models, outcomes
//! ├── application/     # SolverUseCase (what the explorer calls)
//! └── infrastructure/  # translation, IntervalSolver, pool, cache, adapter
//! ```
//!
//! The adapter owns a call-scoped cache and one pooled backend lease; it is
//! created at `explore()` entry and dropped at exit.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::SolverUseCase;
pub use domain::{ModelValue, Problem, SolveOutcome, SolverError, SolverModel, Sort, Term};
pub use infrastructure::{
    translate, AdapterStats, IntervalSolver, SolverAdapter, SolverBackend, SolverLease, SolverPool,
    Translation,
};
