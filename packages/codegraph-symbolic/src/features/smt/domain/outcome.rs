//! Solve outcomes and solver errors

use super::model::SolverModel;
use thiserror::Error;

/// Result of one satisfiability query
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Sat(SolverModel),
    Unsat,
    /// Timeout, unsupported construct, gated type, or backend failure
    Unknown(String),
}

impl SolveOutcome {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveOutcome::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, SolveOutcome::Unsat)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SolveOutcome::Sat(_) => "sat",
            SolveOutcome::Unsat => "unsat",
            SolveOutcome::Unknown(_) => "unknown",
        }
    }
}

/// Backend failure. Never escapes the adapter: every variant is normalized
/// into `SolveOutcome::Unknown`.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("Solver unavailable: {0}")]
    Unavailable(String),

    #[error("Solver timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("Solver backend crashed: {0}")]
    BackendCrashed(String),

    #[error("Unsupported term: {0}")]
    Unsupported(String),

    #[error("Cancelled while waiting for a solver")]
    Cancelled,
}
