//! Tier presets
//!
//! Each tier provides a complete default capability snapshot.

use super::capability::{CapabilitySnapshot, ConstraintTypes, FeatureFlags, Limit};
use super::error::ConfigError;
use crate::shared::SymbolicType;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Capability tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Free tier
    ///
    /// - 50 paths, depth 10, loops unrolled 3 times
    /// - int/bool constraints only
    /// - no optional features
    #[default]
    Community,

    /// Paid tier
    ///
    /// - 500 paths, depth 50, loops unrolled 8 times
    /// - int/bool/string/float constraints
    /// - smart prioritization + concolic replay
    Pro,

    /// Unlimited tier
    ///
    /// - no path or depth budget, loops unrolled 16 times
    /// - every constraint type, every feature
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Community, Tier::Pro, Tier::Enterprise];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Complete default snapshot for this tier
    pub fn snapshot(&self) -> CapabilitySnapshot {
        match self {
            Self::Community => CapabilitySnapshot {
                tier: *self,
                max_paths: Limit::Finite(50),
                max_depth: Limit::Finite(10),
                max_loop_iterations: 3,
                constraint_types: ConstraintTypes::of(&[SymbolicType::Int, SymbolicType::Bool]),
                features: FeatureFlags::default(),
                solver_timeout_ms: 2_000,
                global_timeout_ms: 30_000,
                solver_pool_size: 2,
            },
            Self::Pro => CapabilitySnapshot {
                tier: *self,
                max_paths: Limit::Finite(500),
                max_depth: Limit::Finite(50),
                max_loop_iterations: 8,
                constraint_types: ConstraintTypes::of(&[
                    SymbolicType::Int,
                    SymbolicType::Bool,
                    SymbolicType::String,
                    SymbolicType::Float,
                ]),
                features: FeatureFlags {
                    smart_path_prioritization: true,
                    concolic_execution: true,
                    ..FeatureFlags::default()
                },
                solver_timeout_ms: 5_000,
                global_timeout_ms: 120_000,
                solver_pool_size: 4,
            },
            Self::Enterprise => CapabilitySnapshot {
                tier: *self,
                max_paths: Limit::Unlimited,
                max_depth: Limit::Unlimited,
                max_loop_iterations: 16,
                constraint_types: ConstraintTypes::All,
                features: FeatureFlags::all(),
                solver_timeout_ms: 10_000,
                global_timeout_ms: 600_000,
                solver_pool_size: 8,
            },
        }
    }
}

impl FromStr for Tier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "community" | "free" => Ok(Self::Community),
            "pro" => Ok(Self::Pro),
            "enterprise" => Ok(Self::Enterprise),
            _ => Err(ConfigError::UnknownTier(s.to_string())),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parsing() {
        assert_eq!("community".parse::<Tier>().unwrap(), Tier::Community);
        assert_eq!("PRO".parse::<Tier>().unwrap(), Tier::Pro);
        assert_eq!("enterprise".parse::<Tier>().unwrap(), Tier::Enterprise);
        assert!(matches!(
            "gold".parse::<Tier>(),
            Err(ConfigError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Community.to_string(), "community");
        assert_eq!(Tier::Enterprise.to_string(), "enterprise");
    }

    #[test]
    fn test_every_tier_snapshot_is_valid() {
        for tier in Tier::ALL {
            let snapshot = tier.snapshot();
            assert_eq!(snapshot.tier, tier);
            assert!(snapshot.validate().is_ok(), "{} snapshot invalid", tier);
        }
    }

    #[test]
    fn test_tiers_widen_budgets() {
        let community = Tier::Community.snapshot();
        let enterprise = Tier::Enterprise.snapshot();
        assert_eq!(community.max_paths, Limit::Finite(50));
        assert_eq!(enterprise.max_paths, Limit::Unlimited);
        assert!(!community.constraint_types.allows(SymbolicType::Dict));
        assert!(enterprise.constraint_types.allows(SymbolicType::Dict));
        assert!(enterprise.features.equivalence_checking);
    }

    #[test]
    fn test_default_tier() {
        assert_eq!(Tier::default(), Tier::Community);
    }
}
