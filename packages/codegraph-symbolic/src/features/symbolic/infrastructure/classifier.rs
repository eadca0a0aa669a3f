//! Feasibility classifier
//!
//! Turns an `ExplorationOutcome` into the caller-facing report. Pure: the
//! same outcome always yields a byte-identical report.

use super::confidence::ConfidenceScorer;
use crate::features::symbolic::domain::{
    BranchId, ClassifiedPath, Coverage, DecisionKind, ExplorationOutcome, FeasibilityReport,
    LoopWarning, PathStatus,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default)]
pub struct FeasibilityClassifier {
    scorer: ConfidenceScorer,
}

impl FeasibilityClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scorer(scorer: ConfidenceScorer) -> Self {
        Self { scorer }
    }

    pub fn classify(&self, outcome: &ExplorationOutcome) -> FeasibilityReport {
        let mut paths: Vec<ClassifiedPath> = outcome.paths.clone();
        paths.sort_by_key(|p| p.path.id());
        for p in &mut paths {
            p.confidence = self.scorer.score(p);
        }

        let count = |pred: fn(&PathStatus) -> bool| paths.iter().filter(|p| pred(&p.status)).count();
        let feasible_count = count(|s| matches!(s, PathStatus::Feasible { .. }));
        let infeasible_count = count(|s| matches!(s, PathStatus::Infeasible));
        let unknown_count = count(|s| matches!(s, PathStatus::Unknown { .. }));
        let pruned_count = count(|s| matches!(s, PathStatus::Pruned { .. }));

        FeasibilityReport {
            function: outcome.function.clone(),
            signature: outcome.signature.clone(),
            coverage: coverage(outcome, &paths),
            loop_warnings: loop_warnings(outcome, &paths),
            total_paths_explored: paths.len(),
            paths,
            feasible_count,
            infeasible_count,
            unknown_count,
            pruned_count,
            budget_exceeded: outcome.budget_exceeded,
            termination: outcome.termination,
            solver_degraded: outcome.solver_degraded,
        }
    }
}

/// Branch edges taken by at least one feasible path
fn coverage(outcome: &ExplorationOutcome, paths: &[ClassifiedPath]) -> Coverage {
    let covered: BTreeSet<(BranchId, bool)> = paths
        .iter()
        .filter(|p| p.is_feasible())
        .flat_map(|p| p.path.decisions())
        .filter(|d| d.kind != DecisionKind::FuelExhausted)
        .map(|d| (d.branch, d.outcome))
        .collect();
    let total_edges = outcome.branch_points.len() * 2;
    let ratio = if total_edges == 0 {
        if paths.iter().any(ClassifiedPath::is_feasible) {
            1.0
        } else {
            0.0
        }
    } else {
        covered.len() as f64 / total_edges as f64
    };
    Coverage {
        covered_edges: covered.len(),
        total_edges,
        ratio,
    }
}

/// Loop guards that feasible paths leave only through fuel exhaustion
fn loop_warnings(outcome: &ExplorationOutcome, paths: &[ClassifiedPath]) -> Vec<LoopWarning> {
    outcome
        .branch_points
        .iter()
        .filter(|bp| bp.is_loop_guard())
        .filter_map(|bp| {
            let mut forced = false;
            let mut natural_exit = false;
            for p in paths.iter().filter(|p| p.is_feasible()) {
                for d in p.path.decisions().iter().filter(|d| d.branch == bp.id) {
                    match (d.kind, d.outcome) {
                        (DecisionKind::FuelExhausted, _) => forced = true,
                        (_, false) => natural_exit = true,
                        _ => {}
                    }
                }
            }
            (forced && !natural_exit).then(|| LoopWarning {
                branch: bp.id,
                span: bp.span,
                guard: bp.expr.to_string(),
                message: format!(
                    "loop at line {} exits only when the iteration bound runs out; it may not terminate",
                    bp.span.start_line
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CapabilitySnapshot, Tier};
    use crate::features::parsing::parse_source;
    use crate::features::smt::infrastructure::SolverPool;
    use crate::features::symbolic::infrastructure::PathExplorer;
    use crate::shared::CancellationToken;
    use std::sync::Arc;

    fn report(src: &str) -> FeasibilityReport {
        let module = parse_source(src, "python").unwrap();
        let func = module.function(None).unwrap();
        let outcome = PathExplorer::new(Arc::new(SolverPool::new(1)))
            .explore(func, &CapabilitySnapshot::for_tier(Tier::Community), &CancellationToken::new())
            .unwrap();
        FeasibilityClassifier::new().classify(&outcome)
    }

    #[test]
    fn test_counts_and_coverage() {
        let r = report(
            "def f(x):\n    if x > 10:\n        if x < 5:\n            return 1\n        return 2\n    return 3\n",
        );
        assert_eq!(r.total_paths_explored, 3);
        assert_eq!(r.feasible_count, 2);
        assert_eq!(r.infeasible_count, 1);
        assert_eq!(r.coverage.total_edges, 4);
        // x < 5 never holds once x > 10
        assert_eq!(r.coverage.covered_edges, 3);
        assert!(r.paths.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
    }

    #[test]
    fn test_infinite_loop_warns() {
        let r = report("def f(x):\n    while True:\n        x = x + 1\n    return x\n");
        assert_eq!(r.loop_warnings.len(), 1);
        assert_eq!(r.loop_warnings[0].guard, "True");
    }

    #[test]
    fn test_bounded_loop_does_not_warn() {
        let r = report("def f(x):\n    while x > 0:\n        x = x - 1\n    return x\n");
        assert!(r.loop_warnings.is_empty());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let module =
            parse_source("def f(a):\n    if a == 3:\n        return 1\n    return 0\n", "python").unwrap();
        let outcome = PathExplorer::new(Arc::new(SolverPool::new(1)))
            .explore(
                module.function(None).unwrap(),
                &CapabilitySnapshot::default(),
                &CancellationToken::new(),
            )
            .unwrap();
        let classifier = FeasibilityClassifier::new();
        let first = serde_json::to_string(&classifier.classify(&outcome)).unwrap();
        let second = serde_json::to_string(&classifier.classify(&outcome)).unwrap();
        assert_eq!(first, second);
    }
}
