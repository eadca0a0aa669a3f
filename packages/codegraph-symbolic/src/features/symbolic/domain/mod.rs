//! Symbolic execution domain: branch points, conditions, paths, verdicts

mod branch;
mod classified;
mod condition;
mod path;
mod report;

pub use branch::{BranchId, BranchKind, BranchPoint};
pub use classified::{ClassifiedPath, PathStatus};
pub use condition::{condition_type, is_hidden_symbol, PathCondition, HIDDEN_PREFIX};
pub use path::{Decision, DecisionKind, PathId, SymbolicPath, Terminal};
pub use report::{
    Coverage, ExplorationOutcome, ExplorationStats, FeasibilityReport, LoopWarning, Termination,
};
