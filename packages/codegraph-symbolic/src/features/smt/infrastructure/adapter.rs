//! Constraint solver adapter
//!
//! The only place solver results are produced for the explorer. Everything
//! that can go wrong below this point (gated types, untranslatable
//! conditions, timeouts, backend errors, panics, a missing backend) is
//! normalized into `SolveOutcome::Unknown` here.

use super::cache::{CacheHit, SolveCache};
use super::pool::SolverLease;
use super::translate::translate;
use crate::config::{CapabilitySnapshot, ConstraintTypes};
use crate::features::smt::domain::{SolveOutcome, SolverError, SolverModel};
use crate::features::symbolic::domain::SymbolicPath;
use crate::shared::Deadline;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};

/// Query statistics for one call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdapterStats {
    /// Total queries
    pub total_queries: usize,

    /// Answered from the call-scoped cache
    pub cache_hits: usize,
    pub unsat_prefix_hits: usize,

    /// Queries that reached the backend
    pub solver_calls: usize,

    /// Rejected by the constraint type allow-list
    pub gated: usize,

    pub sat: usize,
    pub unsat: usize,
    pub unknown: usize,
    pub timeouts: usize,
    pub failures: usize,
}

impl AdapterStats {
    /// Hit rates (cache, backend, unknown)
    pub fn hit_rates(&self) -> (f64, f64, f64) {
        if self.total_queries == 0 {
            return (0.0, 0.0, 0.0);
        }
        let total = self.total_queries as f64;
        (
            (self.cache_hits + self.unsat_prefix_hits) as f64 / total,
            self.solver_calls as f64 / total,
            self.unknown as f64 / total,
        )
    }

    fn record(&mut self, outcome: &SolveOutcome) {
        match outcome {
            SolveOutcome::Sat(_) => self.sat += 1,
            SolveOutcome::Unsat => self.unsat += 1,
            SolveOutcome::Unknown(_) => self.unknown += 1,
        }
    }
}

pub struct SolverAdapter {
    lease: Result<SolverLease, String>,
    constraint_types: ConstraintTypes,
    solver_timeout_ms: u64,
    cache: SolveCache,
    stats: AdapterStats,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl SolverAdapter {
    /// `lease` is the result of the pool checkout; a failed checkout leaves
    /// the adapter degraded (every query answers `Unknown`)
    pub fn new(lease: Result<SolverLease, SolverError>, snapshot: &CapabilitySnapshot) -> Self {
        let lease = lease.map_err(|e| {
            tracing::warn!(error = %e, "solver unavailable, every path degrades to unknown");
            e.to_string()
        });
        Self {
            lease,
            constraint_types: snapshot.constraint_types.clone(),
            solver_timeout_ms: snapshot.solver_timeout_ms,
            cache: SolveCache::new(),
            stats: AdapterStats::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.lease.is_err()
    }

    pub fn stats(&self) -> &AdapterStats {
        &self.stats
    }

    /// Decide the conjunction of `path`'s conditions.
    ///
    /// `deadline` is the caller's global budget; the per-call solver timeout
    /// is applied on top of it.
    pub fn solve(&mut self, path: &SymbolicPath, deadline: &Deadline) -> SolveOutcome {
        self.stats.total_queries += 1;
        let outcome = self.solve_inner(path, deadline);
        self.stats.record(&outcome);
        tracing::debug!(
            path = path.id(),
            conditions = path.conditions().len(),
            outcome = outcome.label(),
            "solved path"
        );
        outcome
    }

    fn solve_inner(&mut self, path: &SymbolicPath, deadline: &Deadline) -> SolveOutcome {
        if let Some(c) = path
            .conditions()
            .iter()
            .find(|c| !self.constraint_types.allows(c.ty))
        {
            self.stats.gated += 1;
            return SolveOutcome::Unknown(format!(
                "constraint type '{}' is not enabled (condition: {})",
                c.ty.as_str(),
                c
            ));
        }

        let keys = SolveCache::keys(path);
        match self.cache.lookup(&keys) {
            Some(CacheHit::Exact(outcome)) => {
                self.stats.cache_hits += 1;
                return outcome;
            }
            Some(CacheHit::UnsatPrefix { prefix_len }) => {
                self.stats.unsat_prefix_hits += 1;
                tracing::trace!(path = path.id(), prefix_len, "unsat prefix hit");
                return SolveOutcome::Unsat;
            }
            None => {}
        }

        let lease = match &mut self.lease {
            Ok(lease) => lease,
            Err(reason) => return SolveOutcome::Unknown(format!("solver unavailable: {}", reason)),
        };

        if path.conditions().is_empty() {
            return SolveOutcome::Sat(SolverModel::new());
        }

        let translation = match translate(path) {
            Ok(t) => t,
            Err(e) => return SolveOutcome::Unknown(e.to_string()),
        };

        let call_deadline = deadline.earliest(Deadline::from_millis(self.solver_timeout_ms));
        if call_deadline.is_expired() {
            self.stats.timeouts += 1;
            return SolveOutcome::Unknown("deadline elapsed before solving".to_string());
        }

        self.stats.solver_calls += 1;
        let result = match lease.backend_mut() {
            Some(backend) => panic::catch_unwind(AssertUnwindSafe(|| {
                backend.check(&translation.problem, &call_deadline)
            })),
            None => Ok(Err(SolverError::Unavailable("lease holds no backend".to_string()))),
        };

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e @ SolverError::Timeout { .. })) => {
                self.stats.timeouts += 1;
                SolveOutcome::Unknown(e.to_string())
            }
            Ok(Err(e)) => {
                self.stats.failures += 1;
                SolveOutcome::Unknown(e.to_string())
            }
            Err(payload) => {
                self.stats.failures += 1;
                let e = SolverError::BackendCrashed(panic_message(payload.as_ref()));
                tracing::warn!(error = %e, backend = lease.name(), "solver backend panicked, replacing it");
                lease.reset();
                SolveOutcome::Unknown(e.to_string())
            }
        };

        self.cache.store(&keys, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tier;
    use crate::features::parsing::domain::{CmpOp, Expr};
    use crate::features::smt::domain::{ModelValue, Problem};
    use crate::features::smt::infrastructure::{SolverBackend, SolverPool};
    use crate::features::symbolic::domain::{PathCondition, Terminal};
    use crate::shared::SymbolicType;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn path(conditions: Vec<(Expr, bool, SymbolicType)>) -> SymbolicPath {
        let symbols = BTreeMap::from([
            ("x".to_string(), SymbolicType::Int),
            ("config".to_string(), SymbolicType::Dict),
        ]);
        let conditions = conditions
            .into_iter()
            .enumerate()
            .map(|(i, (e, p, ty))| PathCondition::new(e, p, i as u32, ty))
            .collect();
        SymbolicPath::new(0, conditions, vec![], 0, Terminal::FallThrough, symbols)
    }

    fn gt(v: i64) -> Expr {
        Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(v))
    }

    fn adapter(pool: SolverPool, snapshot: &CapabilitySnapshot) -> SolverAdapter {
        let pool = Arc::new(pool);
        SolverAdapter::new(pool.checkout(Duration::from_millis(10)), snapshot)
    }

    #[test]
    fn test_sat_with_model_and_cache_hit() {
        let snapshot = Tier::Community.snapshot();
        let mut a = adapter(SolverPool::new(1), &snapshot);
        let p = path(vec![(gt(10), true, SymbolicType::Int)]);
        let first = a.solve(&p, &Deadline::never());
        let SolveOutcome::Sat(model) = &first else {
            panic!("expected sat, got {:?}", first);
        };
        assert_eq!(model.get("x"), Some(&ModelValue::Int(11)));
        assert_eq!(a.solve(&p, &Deadline::never()), first);
        assert_eq!(a.stats().cache_hits, 1);
        assert_eq!(a.stats().solver_calls, 1);
    }

    #[test]
    fn test_gated_type_is_unknown() {
        let snapshot = Tier::Community.snapshot();
        let mut a = adapter(SolverPool::new(1), &snapshot);
        let p = path(vec![(
            Expr::compare(CmpOp::In, Expr::str("k"), Expr::name("config")),
            true,
            SymbolicType::Dict,
        )]);
        let out = a.solve(&p, &Deadline::never());
        assert!(matches!(out, SolveOutcome::Unknown(ref r) if r.contains("dict")));
        assert_eq!(a.stats().gated, 1);
    }

    #[test]
    fn test_unavailable_backend_degrades() {
        let snapshot = Tier::Community.snapshot();
        let mut a = adapter(SolverPool::unavailable(), &snapshot);
        assert!(a.is_degraded());
        let out = a.solve(&path(vec![(gt(0), true, SymbolicType::Int)]), &Deadline::never());
        assert!(matches!(out, SolveOutcome::Unknown(_)));
    }

    struct Exploding;

    impl SolverBackend for Exploding {
        fn name(&self) -> &'static str {
            "exploding"
        }

        fn check(&mut self, _: &Problem, _: &Deadline) -> Result<SolveOutcome, SolverError> {
            panic!("backend blew up")
        }
    }

    #[test]
    fn test_backend_panic_becomes_unknown() {
        let snapshot = Tier::Community.snapshot();
        let mut a = adapter(SolverPool::with_factory(1, || Box::new(Exploding)), &snapshot);
        let out = a.solve(&path(vec![(gt(0), true, SymbolicType::Int)]), &Deadline::never());
        assert!(matches!(out, SolveOutcome::Unknown(ref r) if r.contains("blew up")));
        assert_eq!(a.stats().failures, 1);
    }

    #[test]
    fn test_unsat_prefix_reused() {
        let snapshot = Tier::Community.snapshot();
        let mut a = adapter(SolverPool::new(1), &snapshot);
        let contradiction = path(vec![
            (gt(10), true, SymbolicType::Int),
            (gt(5), false, SymbolicType::Int),
        ]);
        assert_eq!(a.solve(&contradiction, &Deadline::never()), SolveOutcome::Unsat);
        let extended = path(vec![
            (gt(10), true, SymbolicType::Int),
            (gt(5), false, SymbolicType::Int),
            (gt(0), true, SymbolicType::Int),
        ]);
        assert_eq!(a.solve(&extended, &Deadline::never()), SolveOutcome::Unsat);
        assert_eq!(a.stats().unsat_prefix_hits, 1);
    }

    #[test]
    fn test_hit_rates_guard_zero() {
        assert_eq!(AdapterStats::default().hit_rates(), (0.0, 0.0, 0.0));
    }
}
