//! Source fixtures and exploration helpers

use codegraph_symbolic::features::smt::infrastructure::SolverPool;
use codegraph_symbolic::features::symbolic::{
    FeasibilityClassifier, FeasibilityReport, PathExplorer,
};
use codegraph_symbolic::{parse_source, CancellationToken, CapabilitySnapshot, FunctionDef};
use std::sync::Arc;

/// Three feasible ranges, one string per range
pub const CLASSIFY: &str = r#"def classify(x):
    if x > 100:
        return "large"
    elif x > 10:
        return "medium"
    return "small"
"#;

/// Membership over a dict parameter
pub const DICT_LOOKUP: &str = r#"def lookup(d: dict):
    if "key" in d:
        return 1
    return 0
"#;

pub const COUNTDOWN: &str = r#"def countdown(n):
    while n > 0:
        n = n - 1
    return n
"#;

/// Never exits except through the iteration bound
pub const SPIN: &str = r#"def spin(x):
    while True:
        x = x + 1
    return x
"#;

pub const GUARDED: &str = r#"def guarded(x):
    assert x > 0
    return x
"#;

pub const CLAMPS: &str = r#"def clamp_a(x):
    if x > 100:
        return 100
    return x

def clamp_b(x):
    if x >= 100:
        return 100
    return x

def clamp_c(x):
    if x > 50:
        return 100
    return x
"#;

/// `n` independent two-way branches, 2^n paths
pub fn fixture_independent_branches(n: usize) -> String {
    let params: Vec<String> = (0..n).map(|i| format!("a{i}")).collect();
    let mut src = format!("def branches({}):\n    total = 0\n", params.join(", "));
    for p in &params {
        src.push_str(&format!("    if {p} > 0:\n        total = total + 1\n"));
    }
    src.push_str("    return total\n");
    src
}

/// Nested thresholds: `x > k` then `x < j`
pub fn fixture_window(k: i64, j: i64) -> String {
    format!("def window(x):\n    if x > {k}:\n        if x < {j}:\n            return 1\n        return 2\n    return 3\n")
}

pub fn function(source: &str) -> FunctionDef {
    parse_source(source, "python")
        .expect("fixture parses")
        .function(None)
        .expect("fixture has a function")
        .clone()
}

/// Explore and classify the first function of `source`
pub fn explore(source: &str, snapshot: &CapabilitySnapshot) -> FeasibilityReport {
    let func = function(source);
    let outcome = PathExplorer::new(Arc::new(SolverPool::new(1)))
        .explore(&func, snapshot, &CancellationToken::new())
        .expect("exploration succeeds");
    FeasibilityClassifier::new().classify(&outcome)
}
