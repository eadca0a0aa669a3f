//! Path explorer
//!
//! Drives one exploration: pulls paths from the extractor, sends each to the
//! solver and records a verdict. The path budget, the global deadline and the
//! caller's cancellation token are all checked between units of work, so an
//! interrupted exploration still returns every path classified so far.

use super::extractor::PathExtractor;
use super::prioritization::PrioritizationStrategy;
use crate::config::CapabilitySnapshot;
use crate::errors::Result;
use crate::features::parsing::domain::{FunctionDef, FunctionSignature};
use crate::features::smt::application::SolverUseCase;
use crate::features::smt::domain::{SolveOutcome, SolverError};
use crate::features::smt::infrastructure::{AdapterStats, SolverAdapter, SolverPool};
use crate::features::symbolic::domain::{
    ClassifiedPath, ExplorationOutcome, ExplorationStats, PathStatus, SymbolicPath, Terminal,
    Termination,
};
use crate::shared::{CancellationToken, Deadline};
use rustc_hash::FxHashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, trace, warn};

/// Exploration lifecycle, traced on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerState {
    Idle,
    Extracting,
    Solving,
    Classifying,
    Done,
}

fn transition(state: &mut ExplorerState, next: ExplorerState) {
    if *state != next {
        trace!(from = ?*state, to = ?next, "Explorer state");
        *state = next;
    }
}

#[derive(Debug, Clone)]
pub struct PathExplorer {
    pool: Arc<SolverPool>,
    strategy: Option<Arc<dyn PrioritizationStrategy>>,
}

impl PathExplorer {
    pub fn new(pool: Arc<SolverPool>) -> Self {
        Self {
            pool,
            strategy: None,
        }
    }

    /// Override the strategy used when smart prioritization is enabled
    pub fn with_strategy(mut self, strategy: Arc<dyn PrioritizationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn pool(&self) -> &Arc<SolverPool> {
        &self.pool
    }

    /// Explore `func` with a backend leased from the shared pool.
    ///
    /// A busy pool is waited on for as long as the global deadline allows.
    pub fn explore(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<ExplorationOutcome> {
        let deadline = Deadline::from_millis(snapshot.global_timeout_ms);
        match self.pool.checkout_until(&deadline, cancel) {
            Err(e @ (SolverError::Timeout { .. } | SolverError::Cancelled)) => {
                debug!(function = %func.name, error = %e, "Interrupted waiting for a solver");
                self.explore_until(func, snapshot, &mut Interrupted, deadline, cancel)
            }
            lease => {
                if let Err(e) = &lease {
                    warn!(function = %func.name, error = %e, "Exploring without a solver");
                }
                let mut adapter = SolverAdapter::new(lease, snapshot);
                self.explore_until(func, snapshot, &mut adapter, deadline, cancel)
            }
        }
    }

    /// Explore with a caller-supplied solver
    pub fn explore_with(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        solver: &mut dyn SolverUseCase,
        cancel: &CancellationToken,
    ) -> Result<ExplorationOutcome> {
        let deadline = Deadline::from_millis(snapshot.global_timeout_ms);
        self.explore_until(func, snapshot, solver, deadline, cancel)
    }

    fn explore_until(
        &self,
        func: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        solver: &mut dyn SolverUseCase,
        deadline: Deadline,
        cancel: &CancellationToken,
    ) -> Result<ExplorationOutcome> {
        let span = info_span!("explore", function = %func.name, tier = %snapshot.tier);
        let _guard = span.enter();

        let mut state = ExplorerState::Idle;
        let signature = FunctionSignature::infer(func);
        let mut extractor = PathExtractor::new(snapshot);
        if let (Some(strategy), true) = (&self.strategy, snapshot.features.smart_path_prioritization)
        {
            extractor = extractor.with_strategy(Arc::clone(strategy));
        }
        let mut paths_iter = extractor.paths(func)?;
        let branch_points = paths_iter.branch_points().to_vec();

        let mut paths: Vec<ClassifiedPath> = Vec::new();
        let mut seen = FxHashSet::default();
        let mut stats = ExplorationStats::default();

        let termination = loop {
            if cancel.is_cancelled() {
                break Termination::Cancelled;
            }
            if deadline.is_expired() {
                break Termination::Timeout;
            }
            if snapshot.max_paths.is_reached(paths.len()) {
                // one more new path means the budget cut exploration short
                break if has_unseen_path(&mut paths_iter, &seen) {
                    Termination::PathBudget
                } else {
                    Termination::Exhausted
                };
            }

            transition(&mut state, ExplorerState::Extracting);
            let Some(path) = paths_iter.next() else {
                break Termination::Exhausted;
            };
            stats.paths_extracted += 1;
            if !seen.insert(path.fingerprint()) {
                stats.duplicates_skipped += 1;
                continue;
            }

            let status = if let Some(reason) = truncation_reason(&path) {
                PathStatus::Pruned { reason }
            } else {
                if cancel.is_cancelled() {
                    break Termination::Cancelled;
                }
                if deadline.is_expired() {
                    break Termination::Timeout;
                }
                transition(&mut state, ExplorerState::Solving);
                let outcome = solver.solve(&path, &deadline);
                transition(&mut state, ExplorerState::Classifying);
                match outcome {
                    SolveOutcome::Sat(model) => PathStatus::Feasible { model },
                    SolveOutcome::Unsat => PathStatus::Infeasible,
                    SolveOutcome::Unknown(reason) => PathStatus::Unknown { reason },
                }
            };
            debug!(
                path = path.id(),
                status = status.label(),
                conditions = path.conditions().len(),
                "Path classified"
            );
            paths.push(ClassifiedPath::new(path, status));
        };
        transition(&mut state, ExplorerState::Done);

        let solver_stats = solver.stats();
        stats.solver_calls = solver_stats.solver_calls;
        stats.cache_hits = solver_stats.cache_hits;
        stats.unsat_prefix_hits = solver_stats.unsat_prefix_hits;
        stats.solver_timeouts = solver_stats.timeouts;
        stats.solver_failures = solver_stats.failures;

        let budget_exceeded =
            !termination.is_complete() || paths.iter().any(|p| p.path.is_truncated());
        info!(
            paths = paths.len(),
            termination = ?termination,
            budget_exceeded,
            solver_calls = stats.solver_calls,
            cache_hits = stats.cache_hits,
            "Exploration finished"
        );

        Ok(ExplorationOutcome {
            function: func.name.clone(),
            signature,
            paths,
            branch_points,
            termination,
            budget_exceeded,
            solver_degraded: solver.is_degraded(),
            stats,
        })
    }
}

/// Stand-in when the deadline or the caller stopped the call before a backend
/// was free. The explorer loop exits before its first solve.
struct Interrupted;

impl SolverUseCase for Interrupted {
    fn solve(&mut self, _: &SymbolicPath, _: &Deadline) -> SolveOutcome {
        SolveOutcome::Unknown("interrupted before a solver was free".to_string())
    }

    fn is_degraded(&self) -> bool {
        false
    }

    fn stats(&self) -> AdapterStats {
        AdapterStats::default()
    }
}

fn has_unseen_path(
    rest: &mut impl Iterator<Item = SymbolicPath>,
    seen: &FxHashSet<blake3::Hash>,
) -> bool {
    rest.any(|p| !seen.contains(&p.fingerprint()))
}

fn truncation_reason(path: &SymbolicPath) -> Option<String> {
    match path.terminal() {
        Terminal::Truncated { reason } => Some(reason.clone()),
        _ => None,
    }
}
