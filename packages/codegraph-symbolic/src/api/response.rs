//! Response envelopes
//!
//! Flat, serde-friendly shapes returned by the engine. Failures are reported
//! in-band (`success = false`, `error`) so a caller never has to match on a
//! Rust error type across a binding boundary.

use crate::features::smt::domain::SolverModel;
use crate::features::symbolic::domain::{
    ClassifiedPath, Coverage, FeasibilityReport, LoopWarning, PathStatus, Termination, Terminal,
};
use crate::features::test_generation::domain::{SkipStats, TestCase, TestSuite};
use crate::features::test_generation::infrastructure::EquivalenceReport;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// Symbolic execution
// ═══════════════════════════════════════════════════════════════════════════

/// One classified path, flattened for transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    pub path_id: u32,
    pub status: String,
    pub conditions: Vec<String>,
    pub depth: usize,
    pub terminal: Terminal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<SolverModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub confidence: f64,
}

impl From<&ClassifiedPath> for PathSummary {
    fn from(cp: &ClassifiedPath) -> Self {
        let reason = match &cp.status {
            PathStatus::Unknown { reason } | PathStatus::Pruned { reason } => Some(reason.clone()),
            PathStatus::Feasible { .. } | PathStatus::Infeasible => None,
        };
        Self {
            path_id: cp.path.id(),
            status: cp.status.label().to_string(),
            conditions: cp.path.conditions().iter().map(|c| c.to_string()).collect(),
            depth: cp.path.depth(),
            terminal: cp.path.terminal().clone(),
            model: cp.model().cloned(),
            reason,
            confidence: cp.confidence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolicExecuteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub total_paths: usize,
    pub feasible_count: usize,
    pub infeasible_count: usize,
    pub unknown_count: usize,
    pub pruned_count: usize,
    pub budget_exceeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,
    pub solver_degraded: bool,
    pub coverage: Coverage,
    pub paths: Vec<PathSummary>,
    pub loop_warnings: Vec<LoopWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymbolicExecuteResponse {
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            function: None,
            total_paths: 0,
            feasible_count: 0,
            infeasible_count: 0,
            unknown_count: 0,
            pruned_count: 0,
            budget_exceeded: false,
            termination: None,
            solver_degraded: false,
            coverage: Coverage::default(),
            paths: Vec::new(),
            loop_warnings: Vec::new(),
            error: Some(error.to_string()),
        }
    }
}

impl From<&FeasibilityReport> for SymbolicExecuteResponse {
    fn from(report: &FeasibilityReport) -> Self {
        Self {
            success: true,
            function: Some(report.function.clone()),
            total_paths: report.total_paths_explored,
            feasible_count: report.feasible_count,
            infeasible_count: report.infeasible_count,
            unknown_count: report.unknown_count,
            pruned_count: report.pruned_count,
            budget_exceeded: report.budget_exceeded,
            termination: Some(report.termination),
            solver_degraded: report.solver_degraded,
            coverage: report.coverage,
            paths: report.paths.iter().map(PathSummary::from).collect(),
            loop_warnings: report.loop_warnings.clone(),
            error: None,
        }
    }
}

/// Batch result for every top-level function of one module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleExecuteResponse {
    pub success: bool,
    pub functions: Vec<SymbolicExecuteResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Test generation
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateTestsResponse {
    pub success: bool,
    pub test_cases: Vec<TestCase>,
    /// Rendered pytest module, empty on failure
    pub test_module: String,
    pub skipped: SkipStats,
    pub budget_exceeded: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl GenerateTestsResponse {
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            test_cases: Vec::new(),
            test_module: String::new(),
            skipped: SkipStats::default(),
            budget_exceeded: false,
            errors: vec![error.to_string()],
            warnings: Vec::new(),
        }
    }
}

impl From<TestSuite> for GenerateTestsResponse {
    fn from(suite: TestSuite) -> Self {
        let mut warnings: Vec<String> = suite
            .test_cases
            .iter()
            .flat_map(|case| case.warnings.iter().map(move |w| format!("{}: {}", case.name, w)))
            .collect();
        if suite.budget_exceeded {
            warnings.push(format!(
                "exploration of {} stopped early; tests cover only the explored paths",
                suite.function
            ));
        }
        Self {
            success: true,
            test_module: suite.render_module(),
            skipped: suite.skipped,
            budget_exceeded: suite.budget_exceeded,
            test_cases: suite.test_cases,
            errors: Vec::new(),
            warnings,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Equivalence
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<EquivalenceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EquivalenceResponse {
    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(error.to_string()),
        }
    }
}

impl From<EquivalenceReport> for EquivalenceResponse {
    fn from(report: EquivalenceReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }
}
