//! Capability snapshot
//!
//! The budgets and feature flags one invocation runs under. Resolved once per
//! call (usually from a `Tier`) and shared read-only behind an `Arc`.

use super::error::{ConfigError, ConfigResult};
use super::preset::Tier;
use crate::shared::SymbolicType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;

/// A count budget that may be unbounded.
///
/// Serialized as an integer or the string `"unlimited"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LimitRepr", into = "LimitRepr")]
pub enum Limit {
    Finite(usize),
    Unlimited,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LimitRepr {
    Count(usize),
    Word(String),
}

impl TryFrom<LimitRepr> for Limit {
    type Error = String;

    fn try_from(repr: LimitRepr) -> Result<Self, Self::Error> {
        match repr {
            LimitRepr::Count(n) => Ok(Limit::Finite(n)),
            LimitRepr::Word(w) if w.eq_ignore_ascii_case("unlimited") => Ok(Limit::Unlimited),
            LimitRepr::Word(w) => Err(format!(
                "expected a non-negative integer or \"unlimited\", got \"{}\"",
                w
            )),
        }
    }
}

impl From<Limit> for LimitRepr {
    fn from(limit: Limit) -> Self {
        match limit {
            Limit::Finite(n) => LimitRepr::Count(n),
            Limit::Unlimited => LimitRepr::Word("unlimited".to_string()),
        }
    }
}

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Limit::Finite(n)
    }
}

impl Limit {
    pub fn get(&self) -> Option<usize> {
        match self {
            Limit::Finite(n) => Some(*n),
            Limit::Unlimited => None,
        }
    }

    /// True once `count` has used up the budget
    pub fn is_reached(&self, count: usize) -> bool {
        match self {
            Limit::Finite(n) => count >= *n,
            Limit::Unlimited => false,
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Finite(n) => write!(f, "{}", n),
            Limit::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Which condition type tags may be sent to the solver.
///
/// Serialized as `"all"` or a list of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConstraintTypesRepr", into = "ConstraintTypesRepr")]
pub enum ConstraintTypes {
    All,
    Only(BTreeSet<SymbolicType>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConstraintTypesRepr {
    Word(String),
    List(Vec<SymbolicType>),
}

impl TryFrom<ConstraintTypesRepr> for ConstraintTypes {
    type Error = String;

    fn try_from(repr: ConstraintTypesRepr) -> Result<Self, Self::Error> {
        match repr {
            ConstraintTypesRepr::Word(w) if w.eq_ignore_ascii_case("all") => {
                Ok(ConstraintTypes::All)
            }
            ConstraintTypesRepr::Word(w) => SymbolicType::from_annotation(&w)
                .map(|ty| ConstraintTypes::Only(BTreeSet::from([ty])))
                .ok_or_else(|| format!("unknown constraint type \"{}\"", w)),
            ConstraintTypesRepr::List(list) => Ok(ConstraintTypes::Only(list.into_iter().collect())),
        }
    }
}

impl From<ConstraintTypes> for ConstraintTypesRepr {
    fn from(types: ConstraintTypes) -> Self {
        match types {
            ConstraintTypes::All => ConstraintTypesRepr::Word("all".to_string()),
            ConstraintTypes::Only(set) => ConstraintTypesRepr::List(set.into_iter().collect()),
        }
    }
}

impl ConstraintTypes {
    pub fn of(types: &[SymbolicType]) -> Self {
        ConstraintTypes::Only(types.iter().copied().collect())
    }

    pub fn allows(&self, ty: SymbolicType) -> bool {
        match self {
            ConstraintTypes::All => true,
            ConstraintTypes::Only(set) => set.contains(&ty),
        }
    }
}

/// Optional analysis features. Absent means disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub smart_path_prioritization: bool,
    pub concolic_execution: bool,
    pub formal_verification: bool,
    pub equivalence_checking: bool,
}

impl FeatureFlags {
    pub fn all() -> Self {
        Self {
            smart_path_prioritization: true,
            concolic_execution: true,
            formal_verification: true,
            equivalence_checking: true,
        }
    }
}

/// Budgets and flags for one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilitySnapshot {
    /// Tier the snapshot was resolved from
    pub tier: Tier,

    /// Maximum number of explored paths
    pub max_paths: Limit,

    /// Maximum number of branch decisions on one path
    pub max_depth: Limit,

    /// Per-branch-point revisit bound for loop guards (>= 1)
    pub max_loop_iterations: u32,

    pub constraint_types: ConstraintTypes,

    #[serde(flatten)]
    pub features: FeatureFlags,

    /// Per-solver-call budget, 0 = unbounded
    pub solver_timeout_ms: u64,

    /// Whole-exploration budget, 0 = unbounded
    pub global_timeout_ms: u64,

    /// Backends held by the shared solver pool
    pub solver_pool_size: usize,
}

impl Default for CapabilitySnapshot {
    fn default() -> Self {
        Tier::default().snapshot()
    }
}

impl CapabilitySnapshot {
    pub fn for_tier(tier: Tier) -> Self {
        tier.snapshot()
    }

    pub fn max_paths(mut self, limit: impl Into<Limit>) -> Self {
        self.max_paths = limit.into();
        self
    }

    pub fn max_depth(mut self, limit: impl Into<Limit>) -> Self {
        self.max_depth = limit.into();
        self
    }

    pub fn max_loop_iterations(mut self, n: u32) -> Self {
        self.max_loop_iterations = n;
        self
    }

    pub fn constraint_types(mut self, types: ConstraintTypes) -> Self {
        self.constraint_types = types;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn solver_timeout_ms(mut self, ms: u64) -> Self {
        self.solver_timeout_ms = ms;
        self
    }

    pub fn global_timeout_ms(mut self, ms: u64) -> Self {
        self.global_timeout_ms = ms;
        self
    }

    pub fn solver_pool_size(mut self, n: usize) -> Self {
        self.solver_pool_size = n;
        self
    }

    /// Validate ranges and cross-field consistency
    pub fn validate(&self) -> ConfigResult<()> {
        if let Limit::Finite(n) = self.max_paths {
            if n == 0 || n > 1_000_000 {
                return Err(ConfigError::range_with_hint(
                    "max_paths",
                    n,
                    1,
                    1_000_000,
                    "Use \"unlimited\" instead of very large path budgets",
                ));
            }
        }

        if let Limit::Finite(n) = self.max_depth {
            if n == 0 || n > 10_000 {
                return Err(ConfigError::range_with_hint(
                    "max_depth",
                    n,
                    1,
                    10_000,
                    "Path depth must allow at least one branch decision",
                ));
            }
        }

        if self.max_loop_iterations == 0 || self.max_loop_iterations > 1024 {
            return Err(ConfigError::range_with_hint(
                "max_loop_iterations",
                self.max_loop_iterations,
                1,
                1024,
                "Loops must be unrolled at least once",
            ));
        }

        if let ConstraintTypes::Only(set) = &self.constraint_types {
            if set.is_empty() {
                return Err(ConfigError::Validation(
                    "constraint_types must name at least one type (or \"all\")".to_string(),
                ));
            }
        }

        if self.solver_timeout_ms > 600_000 {
            return Err(ConfigError::range_with_hint(
                "solver_timeout_ms",
                self.solver_timeout_ms,
                0,
                600_000,
                "A single solver call should finish within 10 minutes",
            ));
        }

        if self.global_timeout_ms > 3_600_000 {
            return Err(ConfigError::range_with_hint(
                "global_timeout_ms",
                self.global_timeout_ms,
                0,
                3_600_000,
                "Exploration timeout should be at most 1 hour",
            ));
        }

        if self.solver_pool_size == 0 || self.solver_pool_size > 256 {
            return Err(ConfigError::range_with_hint(
                "solver_pool_size",
                self.solver_pool_size,
                1,
                256,
                "The pool needs at least one backend",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_serde_forms() {
        let finite: Limit = serde_json::from_str("50").unwrap();
        assert_eq!(finite, Limit::Finite(50));
        let unlimited: Limit = serde_json::from_str("\"Unlimited\"").unwrap();
        assert_eq!(unlimited, Limit::Unlimited);
        assert!(serde_json::from_str::<Limit>("\"lots\"").is_err());
        assert_eq!(serde_json::to_string(&Limit::Unlimited).unwrap(), "\"unlimited\"");
    }

    #[test]
    fn test_limit_is_reached() {
        assert!(Limit::Finite(3).is_reached(3));
        assert!(!Limit::Finite(3).is_reached(2));
        assert!(!Limit::Unlimited.is_reached(usize::MAX));
    }

    #[test]
    fn test_constraint_types_forms() {
        let all: ConstraintTypes = serde_json::from_str("\"all\"").unwrap();
        assert!(all.allows(SymbolicType::Dict));

        let some: ConstraintTypes = serde_json::from_str("[\"int\", \"str\"]").unwrap();
        assert!(some.allows(SymbolicType::String));
        assert!(!some.allows(SymbolicType::Dict));
    }

    #[test]
    fn test_absent_flags_are_disabled() {
        let flags: FeatureFlags = serde_json::from_str("{\"concolic_execution\": true}").unwrap();
        assert!(flags.concolic_execution);
        assert!(!flags.formal_verification);
        assert!(!flags.equivalence_checking);
    }

    #[test]
    fn test_validation_rejects_zero_loop_bound() {
        let snapshot = CapabilitySnapshot::default().max_loop_iterations(0);
        let err = snapshot.validate().unwrap_err();
        assert!(err.to_string().contains("max_loop_iterations"));
    }

    #[test]
    fn test_validation_rejects_empty_type_set() {
        let snapshot = CapabilitySnapshot::default().constraint_types(ConstraintTypes::of(&[]));
        assert!(matches!(snapshot.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_builder_overrides() {
        let snapshot = CapabilitySnapshot::for_tier(Tier::Community)
            .max_paths(Limit::Unlimited)
            .max_depth(Limit::Finite(20));
        assert_eq!(snapshot.max_paths, Limit::Unlimited);
        assert_eq!(snapshot.max_depth, Limit::Finite(20));
        assert!(snapshot.validate().is_ok());
    }
}
