//! SMT domain: terms, models and outcomes

mod model;
mod outcome;
mod term;

pub use model::{ModelValue, SolverModel};
pub use outcome::{SolveOutcome, SolverError};
pub use term::{Problem, Sort, Term};
