//! Test case synthesizer
//!
//! One test per feasible path. Inputs come from the path's model, coerced to
//! the parameter's declared or inferred type. Parameters the path leaves free
//! get a boundary value, containers are rebuilt from their length and
//! membership atoms. With concolic replay enabled each test is run
//! concretely and its branch trace checked against the path.

use super::boundary::BoundaryPlanner;
use super::coercion::{coerce, coerce_native};
use crate::config::CapabilitySnapshot;
use crate::features::parsing::domain::semantics::py_eq;
use crate::features::parsing::domain::{Expr, FunctionDef, FunctionSignature};
use crate::features::smt::domain::{ModelValue, SolverModel};
use crate::features::smt::infrastructure::{translate, Translation};
use crate::features::symbolic::domain::{
    is_hidden_symbol, BranchId, ClassifiedPath, FeasibilityReport, PathStatus, SymbolicPath,
    Terminal,
};
use crate::features::symbolic::infrastructure::{
    evaluate, ConcreteInterpreter, ConcreteOutcome, Program,
};
use crate::features::test_generation::domain::{
    Coerced, ExpectedBehavior, RequestedType, SkipStats, SynthesisWarning, TestCase, TestInput,
    TestSuite,
};
use crate::shared::{NativeValue, SymbolicType};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Containers longer than this are capped when rebuilt from a model
const MAX_CONTAINER_LEN: usize = 256;

#[derive(Debug, Clone, Copy, Default)]
pub struct TestSynthesizer {
    concolic: bool,
    formal_verification: bool,
}

impl TestSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_snapshot(snapshot: &CapabilitySnapshot) -> Self {
        Self {
            concolic: snapshot.features.concolic_execution,
            formal_verification: snapshot.features.formal_verification,
        }
    }

    pub fn with_concolic(mut self, enabled: bool) -> Self {
        self.concolic = enabled;
        self
    }

    pub fn synthesize(&self, report: &FeasibilityReport, func: &FunctionDef) -> TestSuite {
        let signature = FunctionSignature::infer(func);
        let planner = BoundaryPlanner::from_report(report);
        let program = if self.concolic {
            match Program::compile(func, self.formal_verification) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(function = %func.name, error = %e, "Concolic replay disabled");
                    None
                }
            }
        } else {
            None
        };

        let mut skipped = SkipStats::default();
        let mut test_cases = Vec::new();
        for cp in &report.paths {
            match &cp.status {
                PathStatus::Feasible { model } => {
                    let mut case = self.build_case(cp, model, &func.name, &signature, &planner);
                    if let Some(program) = &program {
                        replay(program, &mut case, &cp.path);
                    }
                    for w in &case.warnings {
                        warn!(test = %case.name, warning = %w, "Synthesis warning");
                    }
                    test_cases.push(case);
                }
                PathStatus::Infeasible => skipped.infeasible += 1,
                PathStatus::Unknown { .. } => skipped.unknown += 1,
                PathStatus::Pruned { .. } => skipped.pruned += 1,
            }
        }

        info!(
            function = %func.name,
            tests = test_cases.len(),
            skipped = skipped.total(),
            "Test suite synthesized"
        );
        TestSuite {
            function: func.name.clone(),
            params: signature.param_names().map(String::from).collect(),
            test_cases,
            skipped,
            function_source: func.source_text.clone(),
            budget_exceeded: report.budget_exceeded,
        }
    }

    fn build_case(
        &self,
        cp: &ClassifiedPath,
        model: &SolverModel,
        function: &str,
        signature: &FunctionSignature,
        planner: &BoundaryPlanner,
    ) -> TestCase {
        let path = &cp.path;
        let (inputs, mut warnings) = inputs_for(path, model, signature, planner);
        let env: FxHashMap<String, NativeValue> = inputs
            .iter()
            .map(|i| (i.name.clone(), i.value.clone()))
            .collect();
        let opaque = opaque_condition_symbols(path);
        let (expected_behavior, expected_return) = if opaque.is_empty() {
            expectation(path, &env)
        } else {
            warnings.push(SynthesisWarning::OpaqueCondition { symbols: opaque });
            (exercises(path), None)
        };
        debug!(path = path.id(), behavior = %expected_behavior, "Test case built");

        TestCase {
            name: format!("test_{}_path_{}", function, path.id()),
            function: function.to_string(),
            path_id: path.id(),
            inputs,
            expected_behavior,
            expected_return,
            description: format!("Path {}: {}", path.id(), path.describe_conditions()),
            warnings,
            replay_verified: None,
        }
    }
}

/// Concrete inputs for one feasible path, in parameter order
pub fn inputs_for(
    path: &SymbolicPath,
    model: &SolverModel,
    signature: &FunctionSignature,
    planner: &BoundaryPlanner,
) -> (Vec<TestInput>, Vec<SynthesisWarning>) {
    let translation = translate(path).ok();
    let mut warnings = Vec::new();
    let inputs = signature
        .params
        .iter()
        .map(|param| {
            let requested = RequestedType::from(param.ty);
            let Coerced { value, warning } = if param.ty.is_container() {
                Coerced::clean(container(&param.name, param.ty, model, translation.as_ref(), planner))
            } else if let Some(v) = model.get(&param.name) {
                coerce(v, requested)
            } else if let Some(b) = planner.scalar(&param.name) {
                coerce_native(&b.satisfy, requested)
            } else {
                Coerced::clean(requested.default_value())
            };
            if let Some(w) = warning {
                warnings.push(SynthesisWarning::ValueCoercion(w));
            }
            TestInput {
                name: param.name.clone(),
                value,
            }
        })
        .collect();
    (inputs, warnings)
}

fn needle_value(needle: &Expr, model: &SolverModel) -> Option<NativeValue> {
    match needle {
        Expr::Name(n) => model.get(n).map(ModelValue::to_native),
        other => other.as_literal(),
    }
}

/// Rebuild a list or dict from `len(c)` and `in(c, k)` atoms
fn container(
    name: &str,
    ty: SymbolicType,
    model: &SolverModel,
    translation: Option<&Translation>,
    planner: &BoundaryPlanner,
) -> NativeValue {
    let modeled_len = translation
        .and_then(|t| t.length_var(name))
        .and_then(|var| model.get(var))
        .and_then(|v| match v {
            ModelValue::Int(n) => usize::try_from(*n).ok(),
            _ => None,
        });

    let mut members: Vec<NativeValue> = Vec::new();
    let mut excluded: Vec<NativeValue> = Vec::new();
    for m in translation
        .into_iter()
        .flat_map(|t| &t.memberships)
        .filter(|m| m.container == name)
    {
        let Some(needle) = needle_value(&m.needle, model) else {
            continue;
        };
        match model.get(&m.var) {
            Some(ModelValue::Bool(true)) if !members.iter().any(|x| py_eq(x, &needle)) => {
                members.push(needle)
            }
            Some(ModelValue::Bool(false)) => excluded.push(needle),
            _ => {}
        }
    }

    let length = modeled_len
        .or_else(|| planner.length(name))
        .unwrap_or(0)
        .max(members.len())
        .min(MAX_CONTAINER_LEN.max(members.len()));

    let mut filler = (0i64..).map(NativeValue::Int).filter(|candidate| {
        !excluded.iter().any(|x| py_eq(x, candidate)) && !members.iter().any(|x| py_eq(x, candidate))
    });
    let mut items = members.clone();
    while items.len() < length {
        match filler.next() {
            Some(v) => items.push(v),
            None => break,
        }
    }

    match ty {
        SymbolicType::Dict => {
            NativeValue::Dict(items.into_iter().map(|k| (k, NativeValue::None)).collect())
        }
        _ => NativeValue::List(items),
    }
}

/// Hidden symbols (opaque calls and attributes) read by the path's conditions.
/// The model leaves them free, so the inputs alone do not select the path.
fn opaque_condition_symbols(path: &SymbolicPath) -> Vec<String> {
    let symbols: BTreeSet<String> = path
        .conditions()
        .iter()
        .flat_map(|c| c.expr.free_names())
        .filter(|n| is_hidden_symbol(n))
        .collect();
    symbols.into_iter().collect()
}

fn exercises(path: &SymbolicPath) -> ExpectedBehavior {
    ExpectedBehavior::ExercisesPath {
        path_id: path.id(),
        condition_count: path.conditions().len(),
    }
}

fn expectation(
    path: &SymbolicPath,
    env: &FxHashMap<String, NativeValue>,
) -> (ExpectedBehavior, Option<NativeValue>) {
    let exercises = exercises(path);
    match path.terminal() {
        Terminal::Raise { exception } => (
            ExpectedBehavior::Raises {
                exception: exception.clone().unwrap_or_else(|| "Exception".to_string()),
            },
            None,
        ),
        Terminal::Return { value: Some(e) } => {
            // values that depend on opaque calls cannot be predicted
            if e.free_names().iter().any(|n| is_hidden_symbol(n)) {
                return (exercises, None);
            }
            match evaluate(e, env) {
                Some(NativeValue::Bool(b)) => {
                    (ExpectedBehavior::Returns { value: b }, Some(NativeValue::Bool(b)))
                }
                Some(v) => (exercises, Some(v)),
                None => (exercises, None),
            }
        }
        Terminal::Return { value: None } | Terminal::FallThrough | Terminal::Truncated { .. } => {
            (exercises, None)
        }
    }
}

/// Run the test concretely and compare branch traces
fn replay(program: &Program, case: &mut TestCase, path: &SymbolicPath) {
    let inputs: BTreeMap<String, NativeValue> = case
        .inputs
        .iter()
        .map(|i| (i.name.clone(), i.value.clone()))
        .collect();
    let run = ConcreteInterpreter::new(program).run(&inputs);
    let expected: Vec<(BranchId, bool)> = path
        .decisions()
        .iter()
        .map(|d| (d.branch, d.outcome))
        .collect();

    if let ConcreteOutcome::Inconclusive(reason) = &run.outcome {
        case.replay_verified = Some(false);
        case.warnings.push(SynthesisWarning::ReplayInconclusive {
            reason: reason.clone(),
        });
        return;
    }

    let diverged = expected
        .iter()
        .zip(&run.trace)
        .position(|(a, b)| a != b)
        .or_else(|| {
            (expected.len() != run.trace.len()).then(|| expected.len().min(run.trace.len()))
        });
    if let Some(at) = diverged {
        case.replay_verified = Some(false);
        case.warnings.push(SynthesisWarning::ReplayDiverged { at });
        return;
    }

    case.replay_verified = Some(true);
    match run.outcome {
        ConcreteOutcome::Returned(NativeValue::Bool(b)) => {
            case.expected_behavior = ExpectedBehavior::Returns { value: b };
            case.expected_return = Some(NativeValue::Bool(b));
        }
        ConcreteOutcome::Returned(v) => case.expected_return = Some(v),
        ConcreteOutcome::Raised(kind) => {
            case.expected_behavior = ExpectedBehavior::Raises {
                exception: kind.unwrap_or_else(|| "Exception".to_string()),
            };
            case.expected_return = None;
        }
        ConcreteOutcome::Inconclusive(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConstraintTypes, FeatureFlags};
    use crate::features::parsing::parse_source;
    use crate::features::smt::infrastructure::SolverPool;
    use crate::features::symbolic::infrastructure::{FeasibilityClassifier, PathExplorer};
    use crate::shared::CancellationToken;
    use std::sync::Arc;

    fn suite(src: &str, snapshot: &CapabilitySnapshot) -> TestSuite {
        let module = parse_source(src, "python").unwrap();
        let func = module.function(None).unwrap();
        let outcome = PathExplorer::new(Arc::new(SolverPool::new(1)))
            .explore(func, snapshot, &CancellationToken::new())
            .unwrap();
        let report = FeasibilityClassifier::new().classify(&outcome);
        TestSynthesizer::for_snapshot(snapshot).synthesize(&report, func)
    }

    #[test]
    fn test_bool_terminal_renders_returns() {
        let s = suite(
            "def is_adult(age):\n    if age >= 18:\n        return True\n    return False\n",
            &CapabilitySnapshot::default(),
        );
        assert_eq!(s.test_cases.len(), 2);
        assert_eq!(
            s.test_cases[0].expected_behavior,
            ExpectedBehavior::Returns { value: true }
        );
        assert_eq!(s.test_cases[0].input("age"), Some(&NativeValue::Int(18)));
        assert_eq!(s.test_cases[1].expected_behavior.to_string(), "returns False");
    }

    #[test]
    fn test_raise_terminal() {
        let s = suite(
            "def check(x):\n    if x < 0:\n        raise ValueError('negative')\n    return x\n",
            &CapabilitySnapshot::default(),
        );
        assert_eq!(
            s.test_cases[0].expected_behavior,
            ExpectedBehavior::Raises {
                exception: "ValueError".into()
            }
        );
    }

    #[test]
    fn test_free_parameter_gets_boundary_value() {
        let s = suite(
            "def f(flag: bool, y: int):\n    if flag:\n        return 0\n    if y > 7:\n        return 1\n    return 2\n",
            &CapabilitySnapshot::default(),
        );
        let first = &s.test_cases[0];
        assert_eq!(first.input("flag"), Some(&NativeValue::Bool(true)));
        assert_eq!(first.input("y"), Some(&NativeValue::Int(8)));
    }

    #[test]
    fn test_list_rebuilt_from_length() {
        let snapshot = CapabilitySnapshot::default().constraint_types(ConstraintTypes::All);
        let s = suite(
            "def f(items: list):\n    if len(items) > 2:\n        return 1\n    return 0\n",
            &snapshot,
        );
        match s.test_cases[0].input("items") {
            Some(NativeValue::List(items)) => assert_eq!(items.len(), 3),
            other => panic!("expected a list, got {:?}", other),
        }
    }

    #[test]
    fn test_concolic_replay_verifies_trace() {
        let snapshot = CapabilitySnapshot::default().features(FeatureFlags {
            concolic_execution: true,
            ..FeatureFlags::default()
        });
        let s = suite(
            "def f(x):\n    if x > 10:\n        return x * 2\n    return 0\n",
            &snapshot,
        );
        assert!(s.test_cases.iter().all(|c| c.replay_verified == Some(true)));
        assert_eq!(s.test_cases[0].expected_return, Some(NativeValue::Int(22)));
    }

    #[test]
    fn test_opaque_branch_is_not_asserted() {
        let s = suite(
            "def f(x):\n    if compute(x) > 0:\n        return 1\n    return 0\n",
            &CapabilitySnapshot::default(),
        );
        assert_eq!(s.test_cases.len(), 2);
        for case in &s.test_cases {
            assert_eq!(case.expected_return, None);
            assert!(matches!(
                case.expected_behavior,
                ExpectedBehavior::ExercisesPath { .. }
            ));
            assert!(case
                .warnings
                .iter()
                .any(|w| matches!(w, SynthesisWarning::OpaqueCondition { .. })));
        }
        assert!(!s.render_module().contains("assert result"));
    }

    #[test]
    fn test_infeasible_paths_are_counted_not_tested() {
        let s = suite(
            "def f(x):\n    if x > 10:\n        if x < 5:\n            return 1\n    return 0\n",
            &CapabilitySnapshot::default(),
        );
        assert_eq!(s.skipped.infeasible, 1);
        assert_eq!(s.test_cases.len(), 2);
    }
}
