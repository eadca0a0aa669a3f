//! Test synthesis, replay and rendering

mod common;

use codegraph_symbolic::features::test_generation::domain::ExpectedBehavior;
use codegraph_symbolic::{
    CapabilitySnapshot, FeatureFlags, NativeValue, SymbolicEngine, TestSynthesizer, Tier,
};
use common::*;
use pretty_assertions::assert_eq;

#[test]
fn test_one_test_per_feasible_path() {
    let report = explore(CLASSIFY, &CapabilitySnapshot::default());
    let suite = TestSynthesizer::new().synthesize(&report, &function(CLASSIFY));
    let names: Vec<&str> = suite.test_cases.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "test_classify_path_0",
            "test_classify_path_1",
            "test_classify_path_2"
        ]
    );
    assert_eq!(suite.skipped.total(), 0);
    assert_eq!(suite.params, vec!["x".to_string()]);
}

#[test]
fn test_rendered_module_contains_source_and_tests() {
    let engine = SymbolicEngine::for_tier(Tier::Community).unwrap();
    let response = engine.generate_unit_tests(CLASSIFY, Some("classify"), "python");
    assert!(response.success, "{:?}", response.errors);
    let module = &response.test_module;
    assert!(module.starts_with("# Generated by codegraph-symbolic\nimport pytest\n"));
    assert!(module.contains("def classify(x):\n    if x > 100:"));
    assert!(module.contains("def test_classify_path_0():"));
    assert!(module.contains("    assert result == 'large'"));
    assert!(response.warnings.is_empty());
}

#[test]
fn test_missing_source_renders_stub() {
    let report = explore(CLASSIFY, &CapabilitySnapshot::default());
    let mut func = function(CLASSIFY);
    func.source_text = None;
    let module = TestSynthesizer::new().synthesize(&report, &func).render_module();
    assert!(module.contains("def classify(x):\n    raise NotImplementedError("));
    assert!(module.contains("def test_classify_path_2():"));
}

#[test]
fn test_concolic_replay_confirms_every_path() {
    let snapshot = CapabilitySnapshot::for_tier(Tier::Pro);
    let report = explore(CLASSIFY, &snapshot);
    let suite = TestSynthesizer::for_snapshot(&snapshot).synthesize(&report, &function(CLASSIFY));
    assert_eq!(suite.test_cases.len(), 3);
    for case in &suite.test_cases {
        assert_eq!(case.replay_verified, Some(true), "{}", case.name);
        assert!(case.warnings.is_empty());
    }
}

#[test]
fn test_replay_flags_opaque_calls() {
    let source = "def f(x):\n    if fetch(x) > 0:\n        return 1\n    return 0\n";
    let snapshot = CapabilitySnapshot::default().features(FeatureFlags {
        concolic_execution: true,
        ..FeatureFlags::default()
    });
    let report = explore(source, &snapshot);
    let suite = TestSynthesizer::for_snapshot(&snapshot).synthesize(&report, &function(source));
    assert!(!suite.test_cases.is_empty());
    for case in &suite.test_cases {
        assert_eq!(case.replay_verified, Some(false));
        let warnings: Vec<String> = case.warnings.iter().map(|w| w.to_string()).collect();
        assert!(warnings
            .iter()
            .any(|w| w.starts_with("path depends on unmodeled values (__call_fetch_0)")));
        assert!(warnings
            .iter()
            .any(|w| w.starts_with("concrete replay inconclusive")));
        assert_eq!(case.expected_return, None);
    }
}

#[test]
fn test_assertion_failure_becomes_raises() {
    let snapshot = CapabilitySnapshot::for_tier(Tier::Enterprise);
    let report = explore(GUARDED, &snapshot);
    let suite = TestSynthesizer::for_snapshot(&snapshot).synthesize(&report, &function(GUARDED));
    let raising: Vec<&ExpectedBehavior> = suite
        .test_cases
        .iter()
        .map(|c| &c.expected_behavior)
        .filter(|b| matches!(b, ExpectedBehavior::Raises { .. }))
        .collect();
    assert_eq!(
        raising,
        vec![&ExpectedBehavior::Raises {
            exception: "AssertionError".into()
        }]
    );
    let failing = suite
        .test_cases
        .iter()
        .find(|c| matches!(c.expected_behavior, ExpectedBehavior::Raises { .. }))
        .unwrap();
    match failing.input("x") {
        Some(NativeValue::Int(x)) => assert!(*x <= 0),
        other => panic!("unexpected input {:?}", other),
    }
}

#[test]
fn test_equivalence_through_engine() {
    let engine = SymbolicEngine::for_tier(Tier::Enterprise).unwrap();
    let same = engine.check_equivalence(CLAMPS, "clamp_a", "clamp_b", "python");
    assert!(same.success);
    assert!(same.report.unwrap().equivalent);

    let different = engine.check_equivalence(CLAMPS, "clamp_a", "clamp_c", "python");
    let report = different.report.unwrap();
    assert!(!report.equivalent);
    assert!(!report.counterexamples.is_empty());
}

#[test]
fn test_equivalence_is_gated() {
    let engine = SymbolicEngine::for_tier(Tier::Community).unwrap();
    let response = engine.check_equivalence(CLAMPS, "clamp_a", "clamp_b", "python");
    assert!(!response.success);
    assert!(response.error.unwrap().contains("equivalence_checking"));
}
