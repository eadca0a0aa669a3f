//! Per-path confidence
//!
//! `base(status) * decay^depth`, clamped to `[0, 1]`. Deep paths accumulate
//! more solver approximations, so they score lower.

use crate::errors::{Result, SymbolicError};
use crate::features::symbolic::domain::{ClassifiedPath, PathStatus};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceScorer {
    decay: f64,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self {
            decay: Self::DEFAULT_DECAY,
        }
    }
}

impl ConfidenceScorer {
    pub const DEFAULT_DECAY: f64 = 0.95;

    pub fn new(decay: f64) -> Result<Self> {
        if !decay.is_finite() || decay < 0.0 {
            return Err(SymbolicError::validation(format!(
                "confidence decay must be a finite, non-negative number (got {})",
                decay
            )));
        }
        Ok(Self { decay })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    fn base(status: &PathStatus) -> f64 {
        match status {
            PathStatus::Feasible { .. } => 1.0,
            PathStatus::Unknown { .. } => 0.5,
            PathStatus::Pruned { .. } => 0.25,
            PathStatus::Infeasible => 0.0,
        }
    }

    pub fn score(&self, path: &ClassifiedPath) -> f64 {
        let depth = i32::try_from(path.path.depth()).unwrap_or(i32::MAX);
        (Self::base(&path.status) * self.decay.powi(depth)).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::smt::domain::SolverModel;
    use crate::features::symbolic::domain::{SymbolicPath, Terminal};
    use std::collections::BTreeMap;

    fn classified(depth: usize, status: PathStatus) -> ClassifiedPath {
        let path = SymbolicPath::new(0, vec![], vec![], depth, Terminal::FallThrough, BTreeMap::new());
        ClassifiedPath::new(path, status)
    }

    #[test]
    fn test_rejects_bad_decay() {
        assert!(ConfidenceScorer::new(-0.1).is_err());
        assert!(ConfidenceScorer::new(f64::NAN).is_err());
        assert!(ConfidenceScorer::new(f64::INFINITY).is_err());
        assert!(ConfidenceScorer::new(0.0).is_ok());
    }

    #[test]
    fn test_decays_with_depth() {
        let scorer = ConfidenceScorer::new(0.5).unwrap();
        let feasible = PathStatus::Feasible {
            model: SolverModel::new(),
        };
        assert_eq!(scorer.score(&classified(0, feasible.clone())), 1.0);
        assert_eq!(scorer.score(&classified(2, feasible)), 0.25);
        assert_eq!(scorer.score(&classified(0, PathStatus::Infeasible)), 0.0);
    }

    #[test]
    fn test_large_decay_clamps() {
        let scorer = ConfidenceScorer::new(1.5).unwrap();
        let path = classified(
            4,
            PathStatus::Unknown {
                reason: "timeout".into(),
            },
        );
        assert_eq!(scorer.score(&path), 1.0);
    }
}
