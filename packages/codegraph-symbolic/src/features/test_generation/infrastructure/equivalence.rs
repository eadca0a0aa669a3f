//! Equivalence checking
//!
//! Two functions with the same arity are compared on the union of inputs
//! synthesized for either of them. Parameters are matched by position.
//! Disagreement on any input yields a counterexample. Agreement on all of them
//! is evidence, not proof.

use super::synthesizer::TestSynthesizer;
use crate::config::CapabilitySnapshot;
use crate::errors::{Result, SymbolicError};
use crate::features::parsing::domain::semantics::py_eq;
use crate::features::parsing::domain::FunctionDef;
use crate::features::symbolic::application::SymbolicExecutionUseCase;
use crate::features::symbolic::infrastructure::{ConcreteInterpreter, ConcreteOutcome, Program};
use crate::features::test_generation::domain::TestInput;
use crate::shared::{CancellationToken, NativeValue};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Counterexample {
    /// Named after the left function's parameters
    pub inputs: Vec<TestInput>,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceReport {
    pub left: String,
    pub right: String,
    pub inputs_checked: usize,
    /// Inputs where either side could not be run concretely
    pub inconclusive: usize,
    /// No counterexample was found
    pub equivalent: bool,
    pub counterexamples: Vec<Counterexample>,
    pub budget_exceeded: bool,
}

pub struct EquivalenceChecker<'u> {
    execution: &'u dyn SymbolicExecutionUseCase,
}

impl<'u> EquivalenceChecker<'u> {
    pub fn new(execution: &'u dyn SymbolicExecutionUseCase) -> Self {
        Self { execution }
    }

    pub fn check(
        &self,
        left: &FunctionDef,
        right: &FunctionDef,
        snapshot: &CapabilitySnapshot,
        cancel: &CancellationToken,
    ) -> Result<EquivalenceReport> {
        if !snapshot.features.equivalence_checking {
            return Err(SymbolicError::FeatureDisabled("equivalence_checking"));
        }
        if left.params.len() != right.params.len() {
            return Err(SymbolicError::validation(format!(
                "cannot compare {} ({} parameters) with {} ({} parameters)",
                left.name,
                left.params.len(),
                right.name,
                right.params.len()
            )));
        }

        let formal = snapshot.features.formal_verification;
        let left_program = Program::compile(left, formal)?;
        let right_program = Program::compile(right, formal)?;
        let left_names: Vec<&str> = left.params.iter().map(|p| p.name.as_str()).collect();

        let synthesizer = TestSynthesizer::for_snapshot(snapshot).with_concolic(false);
        let mut seen = BTreeSet::new();
        let mut vectors: Vec<Vec<NativeValue>> = Vec::new();
        let mut budget_exceeded = false;
        for func in [left, right] {
            let report = self.execution.execute(func, snapshot, cancel)?;
            budget_exceeded |= report.budget_exceeded;
            for case in synthesizer.synthesize(&report, func).test_cases {
                let values: Vec<NativeValue> = case.inputs.into_iter().map(|i| i.value).collect();
                let key = values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
                if seen.insert(key) {
                    vectors.push(values);
                }
            }
        }

        let bind = |func: &FunctionDef, values: &[NativeValue]| -> BTreeMap<String, NativeValue> {
            func.params
                .iter()
                .zip(values)
                .map(|(p, v)| (p.name.clone(), v.clone()))
                .collect()
        };

        let mut counterexamples = Vec::new();
        let mut inconclusive = 0;
        for values in &vectors {
            if cancel.is_cancelled() {
                budget_exceeded = true;
                break;
            }
            let l = ConcreteInterpreter::new(&left_program).run(&bind(left, values)).outcome;
            let r = ConcreteInterpreter::new(&right_program).run(&bind(right, values)).outcome;
            match (&l, &r) {
                (ConcreteOutcome::Inconclusive(_), _) | (_, ConcreteOutcome::Inconclusive(_)) => {
                    inconclusive += 1
                }
                (ConcreteOutcome::Returned(a), ConcreteOutcome::Returned(b)) if py_eq(a, b) => {}
                (ConcreteOutcome::Raised(a), ConcreteOutcome::Raised(b)) if a == b => {}
                _ => {
                    debug!(left = %l, right = %r, "Counterexample found");
                    counterexamples.push(Counterexample {
                        inputs: left_names
                            .iter()
                            .zip(values)
                            .map(|(n, v)| TestInput {
                                name: n.to_string(),
                                value: v.clone(),
                            })
                            .collect(),
                        left: l.to_string(),
                        right: r.to_string(),
                    });
                }
            }
        }

        info!(
            left = %left.name,
            right = %right.name,
            inputs = vectors.len(),
            counterexamples = counterexamples.len(),
            "Equivalence check finished"
        );
        Ok(EquivalenceReport {
            left: left.name.clone(),
            right: right.name.clone(),
            inputs_checked: vectors.len(),
            inconclusive,
            equivalent: counterexamples.is_empty(),
            counterexamples,
            budget_exceeded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureFlags, Tier};
    use crate::features::parsing::parse_source;
    use crate::features::smt::infrastructure::SolverPool;
    use crate::features::symbolic::application::SymbolicExecutionUseCaseImpl;
    use crate::features::symbolic::infrastructure::{FeasibilityClassifier, PathExplorer};
    use std::sync::Arc;

    const SOURCE: &str = "\
def clamp_a(x):
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

def pair(a, b):
    return a
";

    fn use_case() -> SymbolicExecutionUseCaseImpl {
        SymbolicExecutionUseCaseImpl::new(
            PathExplorer::new(Arc::new(SolverPool::new(1))),
            FeasibilityClassifier::new(),
        )
    }

    fn check(left: &str, right: &str, snapshot: &CapabilitySnapshot) -> Result<EquivalenceReport> {
        let module = parse_source(SOURCE, "python").unwrap();
        let execution = use_case();
        EquivalenceChecker::new(&execution).check(
            module.function(Some(left)).unwrap(),
            module.function(Some(right)).unwrap(),
            snapshot,
            &CancellationToken::new(),
        )
    }

    #[test]
    fn test_equivalent_rewrites() {
        let snapshot = CapabilitySnapshot::for_tier(Tier::Enterprise);
        let report = check("clamp_a", "clamp_b", &snapshot).unwrap();
        assert!(report.equivalent);
        assert!(report.inputs_checked >= 2);
        assert_eq!(report.inconclusive, 0);
    }

    #[test]
    fn test_counterexample_found() {
        let snapshot = CapabilitySnapshot::for_tier(Tier::Enterprise);
        let report = check("clamp_a", "clamp_c", &snapshot).unwrap();
        assert!(!report.equivalent);
        for cx in &report.counterexamples {
            assert_eq!(cx.inputs[0].name, "x");
            assert_ne!(cx.left, cx.right);
            match cx.inputs[0].value {
                NativeValue::Int(x) => assert!(x > 50 && x < 100, "x = {}", x),
                ref other => panic!("unexpected input {:?}", other),
            }
        }
    }

    #[test]
    fn test_requires_feature_flag() {
        let snapshot = CapabilitySnapshot::default().features(FeatureFlags::default());
        assert!(matches!(
            check("clamp_a", "clamp_b", &snapshot),
            Err(SymbolicError::FeatureDisabled("equivalence_checking"))
        ));
    }

    #[test]
    fn test_arity_mismatch() {
        let snapshot = CapabilitySnapshot::for_tier(Tier::Enterprise);
        assert!(matches!(
            check("clamp_a", "pair", &snapshot),
            Err(SymbolicError::Validation(_))
        ));
    }
}
