//! Call-scoped solve cache
//!
//! Keys are chained blake3 hashes over the ordered condition sequence, so
//! every prefix of a path has its own key. An UNSAT prefix settles every
//! extension of it without a solver call.

use crate::features::smt::domain::SolveOutcome;
use crate::features::symbolic::domain::SymbolicPath;
use rustc_hash::{FxHashMap, FxHashSet};

pub type CacheKey = [u8; 32];

#[derive(Debug, Clone, PartialEq)]
pub enum CacheHit {
    Exact(SolveOutcome),
    UnsatPrefix { prefix_len: usize },
}

#[derive(Debug, Default)]
pub struct SolveCache {
    results: FxHashMap<CacheKey, SolveOutcome>,
    unsat: FxHashSet<CacheKey>,
}

impl SolveCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// One key per prefix length 1..=n
    pub fn keys(path: &SymbolicPath) -> Vec<CacheKey> {
        let mut prev = [0u8; 32];
        path.conditions()
            .iter()
            .map(|c| {
                let mut hasher = blake3::Hasher::new();
                hasher.update(&prev);
                hasher.update(&[u8::from(c.polarity)]);
                hasher.update(c.expr.to_string().as_bytes());
                prev = *hasher.finalize().as_bytes();
                prev
            })
            .collect()
    }

    pub fn lookup(&self, keys: &[CacheKey]) -> Option<CacheHit> {
        let last = keys.last()?;
        if let Some(outcome) = self.results.get(last) {
            return Some(CacheHit::Exact(outcome.clone()));
        }
        keys.iter()
            .position(|k| self.unsat.contains(k))
            .map(|i| CacheHit::UnsatPrefix { prefix_len: i + 1 })
    }

    /// Definite answers only; `Unknown` may resolve differently on retry
    pub fn store(&mut self, keys: &[CacheKey], outcome: &SolveOutcome) {
        let Some(last) = keys.last() else {
            return;
        };
        match outcome {
            SolveOutcome::Unknown(_) => {}
            SolveOutcome::Unsat => {
                self.unsat.insert(*last);
                self.results.insert(*last, outcome.clone());
            }
            SolveOutcome::Sat(_) => {
                self.results.insert(*last, outcome.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::{CmpOp, Expr};
    use crate::features::symbolic::domain::{PathCondition, Terminal};
    use crate::shared::SymbolicType;
    use std::collections::BTreeMap;

    fn path(bounds: &[i64]) -> SymbolicPath {
        let conditions = bounds
            .iter()
            .map(|b| {
                PathCondition::new(
                    Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(*b)),
                    true,
                    0,
                    SymbolicType::Int,
                )
            })
            .collect();
        SymbolicPath::new(0, conditions, vec![], 0, Terminal::FallThrough, BTreeMap::new())
    }

    #[test]
    fn test_prefix_keys_are_shared() {
        let short = SolveCache::keys(&path(&[1, 2]));
        let long = SolveCache::keys(&path(&[1, 2, 3]));
        assert_eq!(short[..], long[..2]);
        assert_ne!(short[1], long[2]);
    }

    #[test]
    fn test_unsat_prefix_short_circuits() {
        let mut cache = SolveCache::new();
        let prefix = SolveCache::keys(&path(&[1, 2]));
        cache.store(&prefix, &SolveOutcome::Unsat);
        let extended = SolveCache::keys(&path(&[1, 2, 3]));
        assert_eq!(
            cache.lookup(&extended),
            Some(CacheHit::UnsatPrefix { prefix_len: 2 })
        );
    }

    #[test]
    fn test_unknown_not_cached() {
        let mut cache = SolveCache::new();
        let keys = SolveCache::keys(&path(&[1]));
        cache.store(&keys, &SolveOutcome::Unknown("timeout".into()));
        assert!(cache.lookup(&keys).is_none());
        assert!(cache.is_empty());
    }
}
