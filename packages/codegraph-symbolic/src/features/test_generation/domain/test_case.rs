//! Test cases and suites

use super::requested::ValueCoercionWarning;
use crate::features::symbolic::domain::PathId;
use crate::shared::NativeValue;
use serde::Serialize;
use std::fmt;

/// What the generated test asserts about the call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectedBehavior {
    Returns { value: bool },
    Raises { exception: String },
    ExercisesPath { path_id: PathId, condition_count: usize },
}

impl fmt::Display for ExpectedBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedBehavior::Returns { value } => {
                write!(f, "returns {}", if *value { "True" } else { "False" })
            }
            ExpectedBehavior::Raises { exception } => write!(f, "raises {}", exception),
            ExpectedBehavior::ExercisesPath {
                path_id,
                condition_count,
            } => write!(
                f,
                "exercises path {} ({} condition{})",
                path_id,
                condition_count,
                if *condition_count == 1 { "" } else { "s" }
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SynthesisWarning {
    ValueCoercion(ValueCoercionWarning),
    /// Concrete replay left the symbolic path at trace position `at`
    ReplayDiverged { at: usize },
    ReplayInconclusive { reason: String },
    /// The path's branches read values the engine cannot model, so its
    /// outcome is not predicted
    OpaqueCondition { symbols: Vec<String> },
}

impl fmt::Display for SynthesisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisWarning::ValueCoercion(w) => write!(f, "{}", w),
            SynthesisWarning::ReplayDiverged { at } => {
                write!(f, "concrete replay diverged at branch decision {}", at)
            }
            SynthesisWarning::ReplayInconclusive { reason } => {
                write!(f, "concrete replay inconclusive: {}", reason)
            }
            SynthesisWarning::OpaqueCondition { symbols } => write!(
                f,
                "path depends on unmodeled values ({}); outcome not asserted",
                symbols.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestInput {
    pub name: String,
    pub value: NativeValue,
}

/// One synthesized test, built from exactly one feasible path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    /// `test_<function>_path_<id>`
    pub name: String,
    pub function: String,
    pub path_id: PathId,
    /// In parameter order
    pub inputs: Vec<TestInput>,
    pub expected_behavior: ExpectedBehavior,
    /// Value the call should return, when it could be computed
    pub expected_return: Option<NativeValue>,
    pub description: String,
    pub warnings: Vec<SynthesisWarning>,
    /// `None` unless concolic replay ran
    pub replay_verified: Option<bool>,
}

impl TestCase {
    pub fn input(&self, name: &str) -> Option<&NativeValue> {
        self.inputs.iter().find(|i| i.name == name).map(|i| &i.value)
    }
}

/// Paths that produced no test
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SkipStats {
    pub infeasible: usize,
    pub unknown: usize,
    pub pruned: usize,
}

impl SkipStats {
    pub fn total(&self) -> usize {
        self.infeasible + self.unknown + self.pruned
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSuite {
    pub function: String,
    pub params: Vec<String>,
    pub test_cases: Vec<TestCase>,
    pub skipped: SkipStats,
    /// Original function text; a stub is rendered when absent
    pub function_source: Option<String>,
    pub budget_exceeded: bool,
}
