//! Capability file I/O (YAML)
//!
//! Schema v1:
//!
//! ```yaml
//! version: 1
//! tier: pro
//! capabilities:
//!   max_paths: unlimited
//!   constraint_types: [int, bool, dict]
//!   formal_verification: true
//! ```

use super::capability::{CapabilitySnapshot, ConstraintTypes, Limit};
use super::error::{ConfigError, ConfigResult};
use super::preset::Tier;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base tier
    pub tier: String,

    /// Per-field overrides on top of the tier snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilityOverrides>,
}

/// Capability overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_paths: Option<Limit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<Limit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_loop_iterations: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_types: Option<ConstraintTypes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_path_prioritization: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concolic_execution: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formal_verification: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalence_checking: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_timeout_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver_pool_size: Option<usize>,
}

impl CapabilityOverrides {
    pub const FIELDS: &'static [&'static str] = &[
        "max_paths",
        "max_depth",
        "max_loop_iterations",
        "constraint_types",
        "smart_path_prioritization",
        "concolic_execution",
        "formal_verification",
        "equivalence_checking",
        "solver_timeout_ms",
        "global_timeout_ms",
        "solver_pool_size",
    ];

    pub fn apply(self, snapshot: &mut CapabilitySnapshot) {
        if let Some(v) = self.max_paths {
            snapshot.max_paths = v;
        }
        if let Some(v) = self.max_depth {
            snapshot.max_depth = v;
        }
        if let Some(v) = self.max_loop_iterations {
            snapshot.max_loop_iterations = v;
        }
        if let Some(v) = self.constraint_types {
            snapshot.constraint_types = v;
        }
        if let Some(v) = self.smart_path_prioritization {
            snapshot.features.smart_path_prioritization = v;
        }
        if let Some(v) = self.concolic_execution {
            snapshot.features.concolic_execution = v;
        }
        if let Some(v) = self.formal_verification {
            snapshot.features.formal_verification = v;
        }
        if let Some(v) = self.equivalence_checking {
            snapshot.features.equivalence_checking = v;
        }
        if let Some(v) = self.solver_timeout_ms {
            snapshot.solver_timeout_ms = v;
        }
        if let Some(v) = self.global_timeout_ms {
            snapshot.global_timeout_ms = v;
        }
        if let Some(v) = self.solver_pool_size {
            snapshot.solver_pool_size = v;
        }
    }
}

impl From<&CapabilitySnapshot> for CapabilityOverrides {
    fn from(s: &CapabilitySnapshot) -> Self {
        Self {
            max_paths: Some(s.max_paths),
            max_depth: Some(s.max_depth),
            max_loop_iterations: Some(s.max_loop_iterations),
            constraint_types: Some(s.constraint_types.clone()),
            smart_path_prioritization: Some(s.features.smart_path_prioritization),
            concolic_execution: Some(s.features.concolic_execution),
            formal_verification: Some(s.features.formal_verification),
            equivalence_checking: Some(s.features.equivalence_checking),
            solver_timeout_ms: Some(s.solver_timeout_ms),
            global_timeout_ms: Some(s.global_timeout_ms),
            solver_pool_size: Some(s.solver_pool_size),
        }
    }
}

/// Reject unknown keys with a "did you mean" hint before serde sees them
fn check_keys(
    mapping: &serde_yaml::Mapping,
    section: &str,
    valid: &[&str],
) -> ConfigResult<()> {
    for (key, _) in mapping.iter() {
        let Some(name) = key.as_str() else {
            return Err(ConfigError::Validation(format!(
                "non-string key in section '{}'",
                section
            )));
        };
        if !valid.contains(&name) {
            return Err(ConfigError::unknown_field_with_suggestion(
                name,
                section,
                valid.iter().map(|s| s.to_string()).collect(),
            ));
        }
    }
    Ok(())
}

impl CapabilitySnapshot {
    /// Parse and validate a v1 capability document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mapping = raw.as_mapping().ok_or_else(|| {
            ConfigError::Validation("capability file must be a YAML mapping".to_string())
        })?;

        if !mapping.contains_key("version") {
            return Err(ConfigError::MissingVersion);
        }
        check_keys(mapping, "root", &["version", "tier", "capabilities"])?;
        if let Some(caps) = mapping.get("capabilities").and_then(|v| v.as_mapping()) {
            check_keys(caps, "capabilities", CapabilityOverrides::FIELDS)?;
        }

        let export: CapabilityExportV1 = serde_yaml::from_value(raw)?;
        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let tier: Tier = export.tier.parse()?;
        let mut snapshot = tier.snapshot();
        if let Some(overrides) = export.capabilities {
            overrides.apply(&mut snapshot);
        }
        snapshot.validate()?;

        tracing::debug!(tier = %tier, "capability snapshot loaded");
        Ok(snapshot)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as a v1 document with every field spelled out
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = CapabilityExportV1 {
            version: 1,
            tier: self.tier.to_string(),
            capabilities: Some(CapabilityOverrides::from(self)),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::SymbolicType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_yaml_overrides_apply_on_tier() {
        let yaml = r#"
version: 1
tier: community
capabilities:
  max_paths: unlimited
  constraint_types: [int, bool, dict]
  formal_verification: true
"#;
        let snapshot = CapabilitySnapshot::from_yaml_str(yaml).unwrap();
        assert_eq!(snapshot.tier, Tier::Community);
        assert_eq!(snapshot.max_paths, Limit::Unlimited);
        assert_eq!(snapshot.max_depth, Limit::Finite(10));
        assert!(snapshot.constraint_types.allows(SymbolicType::Dict));
        assert!(snapshot.features.formal_verification);
        assert!(!snapshot.features.concolic_execution);
    }

    #[test]
    fn test_yaml_file_loading() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"version: 1\ntier: pro\ncapabilities:\n  max_loop_iterations: 2\n")
            .unwrap();

        let snapshot = CapabilitySnapshot::from_yaml_file(temp_file.path()).unwrap();
        assert_eq!(snapshot.tier, Tier::Pro);
        assert_eq!(snapshot.max_loop_iterations, 2);
    }

    #[test]
    fn test_yaml_missing_version() {
        let result = CapabilitySnapshot::from_yaml_str("tier: pro\n");
        assert!(matches!(result, Err(ConfigError::MissingVersion)));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let result = CapabilitySnapshot::from_yaml_str("version: 2\ntier: pro\n");
        assert!(matches!(
            result,
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_yaml_unknown_field_suggests_closest() {
        let yaml = "version: 1\ntier: pro\ncapabilities:\n  max_pahts: 10\n";
        let err = CapabilitySnapshot::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("Did you mean 'max_paths'"));
    }

    #[test]
    fn test_yaml_invalid_override_fails_validation() {
        let yaml = "version: 1\ntier: pro\ncapabilities:\n  max_loop_iterations: 0\n";
        assert!(matches!(
            CapabilitySnapshot::from_yaml_str(yaml),
            Err(ConfigError::Range { .. })
        ));
    }

    #[test]
    fn test_yaml_export_reloads_identically() {
        let snapshot = Tier::Enterprise.snapshot().max_loop_iterations(4);
        let yaml = snapshot.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("tier: enterprise"));
        assert_eq!(CapabilitySnapshot::from_yaml_str(&yaml).unwrap(), snapshot);
    }
}
