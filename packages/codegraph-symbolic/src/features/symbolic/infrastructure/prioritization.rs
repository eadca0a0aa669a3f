//! Worklist prioritization
//!
//! With `smart_path_prioritization` disabled the extractor runs plain
//! depth-first search. With it enabled, pending states go through a priority
//! queue scored by a `PrioritizationStrategy` (lower scores first, ties in
//! push order), so the emission order stays deterministic.

use crate::config::CapabilitySnapshot;
use crate::features::symbolic::domain::{Decision, PathCondition};
use std::fmt;
use std::sync::Arc;

/// A pending exploration state as seen by a strategy
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub conditions: &'a [PathCondition],
    pub decisions: &'a [Decision],
    /// Forked edges on this prefix that no emitted path has taken yet
    pub novel_edges: usize,
}

pub trait PrioritizationStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Lower is explored sooner
    fn score(&self, candidate: &Candidate<'_>) -> i64;
}

/// Shortest condition lists first
#[derive(Debug, Clone, Copy, Default)]
pub struct FewestConstraintsFirst;

impl PrioritizationStrategy for FewestConstraintsFirst {
    fn name(&self) -> &'static str {
        "fewest_constraints"
    }

    fn score(&self, candidate: &Candidate<'_>) -> i64 {
        candidate.conditions.len() as i64
    }
}

/// Prefixes reaching edges not yet covered first, then fewest constraints
#[derive(Debug, Clone, Copy)]
pub struct NovelCoverageFirst {
    pub novelty_weight: i64,
}

impl Default for NovelCoverageFirst {
    fn default() -> Self {
        Self { novelty_weight: 1024 }
    }
}

impl PrioritizationStrategy for NovelCoverageFirst {
    fn name(&self) -> &'static str {
        "novel_coverage"
    }

    fn score(&self, candidate: &Candidate<'_>) -> i64 {
        candidate.conditions.len() as i64
            - self.novelty_weight.saturating_mul(candidate.novel_edges as i64)
    }
}

/// Strategy for a snapshot: `None` means depth-first
pub fn strategy_for(snapshot: &CapabilitySnapshot) -> Option<Arc<dyn PrioritizationStrategy>> {
    snapshot
        .features
        .smart_path_prioritization
        .then(|| Arc::new(FewestConstraintsFirst) as Arc<dyn PrioritizationStrategy>)
}
