//! Concrete interpreter
//!
//! Runs a compiled `Program` on concrete inputs and records the branch
//! trace. Concolic replay compares this trace with the symbolic path a test
//! was generated from. Calls and other opaque expressions cannot be run, so
//! reaching one makes the run inconclusive rather than wrong.

use super::program::{Instr, Program, RAISES_PREFIX};
use crate::features::parsing::domain::semantics;
use crate::features::parsing::domain::{ArithOp, Expr, LogicalOp};
use crate::features::symbolic::domain::BranchId;
use crate::shared::NativeValue;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_STEPS: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub enum ConcreteOutcome {
    Returned(NativeValue),
    Raised(Option<String>),
    /// Could not be decided concretely (opaque call, step budget)
    Inconclusive(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcreteRun {
    pub outcome: ConcreteOutcome,
    /// `(branch, outcome)` in execution order
    pub trace: Vec<(BranchId, bool)>,
}

enum Stop {
    Raise(String),
    Opaque(String),
}

#[derive(Debug, Clone, Copy)]
pub struct ConcreteInterpreter<'p> {
    program: &'p Program,
    max_steps: usize,
}

impl<'p> ConcreteInterpreter<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self {
            program,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn run(&self, inputs: &BTreeMap<String, NativeValue>) -> ConcreteRun {
        let mut env: FxHashMap<String, NativeValue> =
            inputs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut trace = Vec::new();
        let mut pc = 0usize;

        let finish = |outcome, trace| ConcreteRun { outcome, trace };
        let stopped = |stop: Stop, trace| match stop {
            Stop::Raise(kind) => finish(ConcreteOutcome::Raised(Some(kind)), trace),
            Stop::Opaque(text) => finish(
                ConcreteOutcome::Inconclusive(format!("cannot evaluate `{}` concretely", text)),
                trace,
            ),
        };

        for _ in 0..self.max_steps {
            let Some(instr) = self.program.instrs.get(pc) else {
                return finish(ConcreteOutcome::Returned(NativeValue::None), trace);
            };
            match instr {
                Instr::Assign { target, value } => match eval(value, &env) {
                    Ok(v) => {
                        env.insert(target.clone(), v);
                        pc += 1;
                    }
                    Err(stop) => return stopped(stop, trace),
                },
                Instr::Element {
                    target,
                    iter,
                    index,
                } => {
                    let item = match (env.get(iter), env.get(index)) {
                        (Some(container), Some(NativeValue::Int(i))) => element(container, *i),
                        _ => None,
                    };
                    match item {
                        Some(v) => {
                            env.insert(target.clone(), v);
                            pc += 1;
                        }
                        None => {
                            return stopped(Stop::Raise("TypeError".to_string()), trace);
                        }
                    }
                }
                Instr::Havoc { target } => {
                    env.insert(target.clone(), NativeValue::None);
                    pc += 1;
                }
                Instr::Jump(t) => pc = *t,
                Instr::Return(value) => {
                    let v = match value {
                        Some(e) => match eval(e, &env) {
                            Ok(v) => v,
                            Err(stop) => return stopped(stop, trace),
                        },
                        None => NativeValue::None,
                    };
                    return finish(ConcreteOutcome::Returned(v), trace);
                }
                Instr::Raise(kind) => return finish(ConcreteOutcome::Raised(kind.clone()), trace),
                Instr::End => return finish(ConcreteOutcome::Returned(NativeValue::None), trace),
                Instr::Assume { test, .. } => match eval(test, &env) {
                    Ok(v) if v.truthy() => pc += 1,
                    Ok(_) => {
                        return finish(
                            ConcreteOutcome::Raised(Some("AssertionError".to_string())),
                            trace,
                        )
                    }
                    Err(stop) => return stopped(stop, trace),
                },
                Instr::Branch {
                    point,
                    test,
                    on_true,
                    on_false,
                } => {
                    let taken = match test {
                        // the body runs normally unless it raises on its own
                        Expr::Name(n) if n.starts_with(RAISES_PREFIX) => false,
                        _ => match eval(test, &env) {
                            Ok(v) => v.truthy(),
                            Err(stop) => return stopped(stop, trace),
                        },
                    };
                    trace.push((*point, taken));
                    pc = if taken { *on_true } else { *on_false };
                }
            }
        }
        finish(
            ConcreteOutcome::Inconclusive(format!("step budget of {} exhausted", self.max_steps)),
            trace,
        )
    }
}

/// Evaluate `expr` under `env`; `None` if it raises or cannot be run
pub fn evaluate(expr: &Expr, env: &FxHashMap<String, NativeValue>) -> Option<NativeValue> {
    eval(expr, env).ok()
}

impl std::fmt::Display for ConcreteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConcreteOutcome::Returned(v) => write!(f, "returns {}", v),
            ConcreteOutcome::Raised(Some(kind)) => write!(f, "raises {}", kind),
            ConcreteOutcome::Raised(None) => f.write_str("raises"),
            ConcreteOutcome::Inconclusive(reason) => write!(f, "inconclusive: {}", reason),
        }
    }
}

fn element(container: &NativeValue, index: i64) -> Option<NativeValue> {
    let i = usize::try_from(index).ok()?;
    match container {
        NativeValue::List(items) => items.get(i).cloned(),
        NativeValue::Dict(entries) => entries.get(i).map(|(k, _)| k.clone()),
        NativeValue::Str(s) => s.chars().nth(i).map(|c| NativeValue::Str(c.to_string())),
        _ => None,
    }
}

fn arith_error(op: ArithOp, l: &NativeValue, r: &NativeValue) -> String {
    let by_zero = matches!(op, ArithOp::Div | ArithOp::FloorDiv | ArithOp::Mod)
        && r.as_f64() == Some(0.0);
    if by_zero {
        "ZeroDivisionError"
    } else if l.as_i64().is_some() && r.as_i64().is_some() {
        "OverflowError"
    } else {
        "TypeError"
    }
    .to_string()
}

fn eval(e: &Expr, env: &FxHashMap<String, NativeValue>) -> Result<NativeValue, Stop> {
    Ok(match e {
        Expr::Int(v) => NativeValue::Int(*v),
        Expr::Float(v) => NativeValue::Float(*v),
        Expr::Bool(v) => NativeValue::Bool(*v),
        Expr::Str(v) => NativeValue::Str(v.clone()),
        Expr::None => NativeValue::None,
        Expr::List(items) => NativeValue::List(
            items
                .iter()
                .map(|i| eval(i, env))
                .collect::<Result<_, _>>()?,
        ),
        Expr::Dict(entries) => NativeValue::Dict(
            entries
                .iter()
                .map(|(k, v)| Ok((eval(k, env)?, eval(v, env)?)))
                .collect::<Result<_, _>>()?,
        ),
        Expr::Name(n) => match env.get(n) {
            Some(v) => v.clone(),
            None => return Err(Stop::Raise("NameError".to_string())),
        },
        Expr::Compare { op, left, right } => {
            let (l, r) = (eval(left, env)?, eval(right, env)?);
            match semantics::compare(*op, &l, &r) {
                Some(b) => NativeValue::Bool(b),
                None => return Err(Stop::Raise("TypeError".to_string())),
            }
        }
        Expr::Logical { op, left, right } => {
            let l = eval(left, env)?;
            match (op, l.truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => l,
                _ => eval(right, env)?,
            }
        }
        Expr::Not(inner) => NativeValue::Bool(!eval(inner, env)?.truthy()),
        Expr::Arith { op, left, right } => {
            let (l, r) = (eval(left, env)?, eval(right, env)?);
            match semantics::arith(*op, &l, &r) {
                Some(v) => v,
                None => return Err(Stop::Raise(arith_error(*op, &l, &r))),
            }
        }
        Expr::Neg(inner) => {
            let v = eval(inner, env)?;
            match semantics::negate(&v) {
                Some(v) => v,
                None => return Err(Stop::Raise("TypeError".to_string())),
            }
        }
        Expr::Len(inner) => match eval(inner, env)?.len() {
            Some(n) => NativeValue::Int(n as i64),
            None => return Err(Stop::Raise("TypeError".to_string())),
        },
        Expr::Call { callee, .. } => return Err(Stop::Opaque(format!("{}(...)", callee))),
        Expr::Opaque(text) => return Err(Stop::Opaque(text.clone())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::parse_source;

    fn program(src: &str) -> Program {
        let module = parse_source(src, "python").unwrap();
        Program::compile(module.function(None).unwrap(), false).unwrap()
    }

    fn inputs(pairs: &[(&str, NativeValue)]) -> BTreeMap<String, NativeValue> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_runs_branches_and_returns() {
        let p = program("def f(x):\n    if x > 10:\n        return 'high'\n    return 'low'\n");
        let run = ConcreteInterpreter::new(&p).run(&inputs(&[("x", NativeValue::Int(11))]));
        assert_eq!(run.outcome, ConcreteOutcome::Returned(NativeValue::Str("high".into())));
        assert_eq!(run.trace, vec![(0, true)]);
    }

    #[test]
    fn test_loop_counts_down() {
        let p = program("def f(n):\n    total = 0\n    for i in range(n):\n        total = total + i\n    return total\n");
        let run = ConcreteInterpreter::new(&p).run(&inputs(&[("n", NativeValue::Int(4))]));
        assert_eq!(run.outcome, ConcreteOutcome::Returned(NativeValue::Int(6)));
        assert_eq!(run.trace.len(), 5);
    }

    #[test]
    fn test_division_by_zero_raises() {
        let p = program("def f(x):\n    return 10 // x\n");
        let run = ConcreteInterpreter::new(&p).run(&inputs(&[("x", NativeValue::Int(0))]));
        assert_eq!(
            run.outcome,
            ConcreteOutcome::Raised(Some("ZeroDivisionError".into()))
        );
    }

    #[test]
    fn test_calls_are_inconclusive() {
        let p = program("def f(x):\n    if helper(x):\n        return 1\n    return 0\n");
        let run = ConcreteInterpreter::new(&p).run(&inputs(&[("x", NativeValue::Int(1))]));
        assert!(matches!(run.outcome, ConcreteOutcome::Inconclusive(_)));
    }

    #[test]
    fn test_step_budget() {
        let p = program("def f(x):\n    while True:\n        x = x + 1\n    return x\n");
        let run = ConcreteInterpreter::new(&p)
            .with_max_steps(50)
            .run(&inputs(&[("x", NativeValue::Int(0))]));
        assert!(matches!(run.outcome, ConcreteOutcome::Inconclusive(_)));
    }
}
