//! Capability files on disk

use codegraph_symbolic::config::{ConfigError, ConstraintTypes};
use codegraph_symbolic::{CapabilitySnapshot, Limit, SymbolicEngine, SymbolicType, Tier};
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_yaml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_file_and_build_engine() {
    let file = write_yaml(
        r#"
version: 1
tier: pro
capabilities:
  max_paths: 20
  max_loop_iterations: 2
  equivalence_checking: true
"#,
    );
    let snapshot = CapabilitySnapshot::from_yaml_file(file.path()).unwrap();
    assert_eq!(snapshot.tier, Tier::Pro);
    assert_eq!(snapshot.max_paths, Limit::Finite(20));
    assert_eq!(snapshot.max_loop_iterations, 2);
    assert!(snapshot.features.equivalence_checking);
    assert!(snapshot.features.concolic_execution);

    let engine = SymbolicEngine::new(snapshot).unwrap();
    assert_eq!(engine.snapshot().max_paths, Limit::Finite(20));
}

#[test]
fn test_exported_yaml_reloads_identically() {
    let snapshot = CapabilitySnapshot::for_tier(Tier::Community)
        .max_depth(Limit::Unlimited)
        .constraint_types(ConstraintTypes::of(&[SymbolicType::Int, SymbolicType::Dict]));
    let file = write_yaml(&snapshot.to_yaml().unwrap());
    let reloaded = CapabilitySnapshot::from_yaml_file(file.path()).unwrap();
    assert_eq!(reloaded, snapshot);
}

#[test]
fn test_unknown_field_suggests_fix() {
    let file = write_yaml("version: 1\ntier: community\ncapabilities:\n  max_path: 10\n");
    let err = CapabilitySnapshot::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownField { .. }));
    assert!(err.to_string().contains("max_paths"));
}

#[test]
fn test_out_of_range_value_is_rejected() {
    let file = write_yaml("version: 1\ntier: enterprise\ncapabilities:\n  max_loop_iterations: 0\n");
    let err = CapabilitySnapshot::from_yaml_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Range { .. }));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CapabilitySnapshot::from_yaml_file(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
