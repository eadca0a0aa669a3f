//! Exploration results and the aggregated feasibility report

use super::branch::{BranchId, BranchPoint};
use super::classified::ClassifiedPath;
use crate::features::parsing::domain::FunctionSignature;
use crate::shared::Span;
use serde::{Deserialize, Serialize};

/// Why exploration stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Every path was extracted
    Exhausted,
    /// `max_paths` reached with work left
    PathBudget,
    /// Global deadline elapsed
    Timeout,
    /// Caller cancelled
    Cancelled,
}

impl Termination {
    pub fn is_complete(&self) -> bool {
        matches!(self, Termination::Exhausted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationStats {
    pub paths_extracted: usize,
    pub duplicates_skipped: usize,
    pub solver_calls: usize,
    pub cache_hits: usize,
    pub unsat_prefix_hits: usize,
    pub solver_timeouts: usize,
    pub solver_failures: usize,
}

/// Raw explorer output, in exploration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationOutcome {
    pub function: String,
    pub signature: FunctionSignature,
    pub paths: Vec<ClassifiedPath>,
    pub branch_points: Vec<BranchPoint>,
    pub termination: Termination,
    /// Stopped early or truncated a path: results are not exhaustive
    pub budget_exceeded: bool,
    /// The solver could not be checked out; every path is `Unknown`
    pub solver_degraded: bool,
    pub stats: ExplorationStats,
}

/// Branch-outcome coverage achieved by feasible paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub covered_edges: usize,
    pub total_edges: usize,
    pub ratio: f64,
}

/// A loop that no feasible path leaves except through the fuel-forced exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopWarning {
    pub branch: BranchId,
    pub span: Span,
    pub guard: String,
    pub message: String,
}

/// Classifier output: ordered by path id, aggregate counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    pub function: String,
    pub signature: FunctionSignature,
    pub paths: Vec<ClassifiedPath>,
    pub feasible_count: usize,
    pub infeasible_count: usize,
    pub unknown_count: usize,
    pub pruned_count: usize,
    pub total_paths_explored: usize,
    pub coverage: Coverage,
    pub budget_exceeded: bool,
    pub termination: Termination,
    pub solver_degraded: bool,
    pub loop_warnings: Vec<LoopWarning>,
}

impl FeasibilityReport {
    pub fn feasible(&self) -> impl Iterator<Item = &ClassifiedPath> {
        self.paths.iter().filter(|p| p.is_feasible())
    }
}
