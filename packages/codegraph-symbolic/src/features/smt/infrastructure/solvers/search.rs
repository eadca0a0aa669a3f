//! Built-in interval solver
//!
//! Propagation and the difference graph prove unsatisfiability; a bounded,
//! deterministic depth-first search over per-variable candidate values finds
//! models. Variables are assigned in name order and every assertion is
//! checked as soon as its last variable is assigned.

use super::difference::DifferenceGraph;
use super::eval::{eval, holds, Assignment};
use super::interval::Domains;
use super::SolverBackend;
use crate::features::smt::domain::{ModelValue, Problem, SolveOutcome, SolverError, SolverModel, Sort, Term};
use crate::shared::{Deadline, NativeValue};
use std::time::Instant;

/// Deadline is polled once per this many search steps
const DEADLINE_POLL: u64 = 256;

const DEFAULT_MAX_STEPS: u64 = 200_000;

#[derive(Debug, Clone)]
pub struct IntervalSolver {
    max_steps: u64,
}

impl Default for IntervalSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalSolver {
    pub fn new() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = steps.max(1);
        self
    }
}

struct Slot<'p> {
    name: &'p str,
    sort: Sort,
    values: Vec<NativeValue>,
    /// Assertions whose last variable (in assignment order) is this one
    checks: Vec<&'p Term>,
}

/// Values of the sides of relational atoms opposite `var`, under the
/// current partial assignment
fn relational_anchors(term: &Term, var: &str, env: &Assignment<'_>, out: &mut Vec<f64>) {
    match term {
        Term::Cmp { left, right, .. } => {
            let left_has = left.vars().contains(&var);
            let right_has = right.vars().contains(&var);
            let other = match (left_has, right_has) {
                (true, false) => right,
                (false, true) => left,
                _ => return,
            };
            if let Some(v) = eval(other, env).and_then(|v| v.as_f64()) {
                if v.is_finite() && !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        Term::And(ts) | Term::Or(ts) => ts.iter().for_each(|t| relational_anchors(t, var, env, out)),
        Term::Not(t) => relational_anchors(t, var, env, out),
        _ => {}
    }
}

/// Static candidates followed by values next to relational anchors
fn expand(slot: &Slot<'_>, env: &Assignment<'_>) -> Vec<NativeValue> {
    let mut values = slot.values.clone();
    if !matches!(slot.sort, Sort::Int | Sort::Real) {
        return values;
    }
    let mut anchors = Vec::new();
    for check in &slot.checks {
        relational_anchors(check, slot.name, env, &mut anchors);
    }
    for anchor in anchors {
        let extra: Vec<NativeValue> = match slot.sort {
            Sort::Int => {
                let k = anchor.floor() as i64;
                [k.saturating_add(1), k, k.saturating_sub(1), k.saturating_add(2)]
                    .into_iter()
                    .map(NativeValue::Int)
                    .collect()
            }
            _ => [anchor + 0.5, anchor, anchor - 0.5]
                .into_iter()
                .map(NativeValue::Float)
                .collect(),
        };
        for v in extra {
            if !values.contains(&v) {
                values.push(v);
            }
        }
    }
    values
}

fn candidates(domains: &Domains, name: &str, sort: Sort) -> (Vec<NativeValue>, bool) {
    match sort {
        Sort::Int => {
            let c = domains.int_candidates(name);
            (c.values.into_iter().map(NativeValue::Int).collect(), c.complete)
        }
        Sort::Bool => {
            let c = domains.bool_candidates(name);
            (c.values.into_iter().map(NativeValue::Bool).collect(), c.complete)
        }
        Sort::Real => {
            let c = domains.real_candidates(name);
            (c.values.into_iter().map(NativeValue::Float).collect(), c.complete)
        }
        Sort::Str => {
            let c = domains.str_candidates(name);
            (c.values.into_iter().map(NativeValue::Str).collect(), c.complete)
        }
    }
}

impl SolverBackend for IntervalSolver {
    fn name(&self) -> &'static str {
        "interval"
    }

    fn check(&mut self, problem: &Problem, deadline: &Deadline) -> Result<SolveOutcome, SolverError> {
        let started = Instant::now();
        let timeout = || SolverError::Timeout {
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        if deadline.is_expired() {
            return Err(timeout());
        }

        for assertion in &problem.assertions {
            if let Some(undeclared) = assertion.vars().into_iter().find(|v| problem.sort_of(v).is_none()) {
                return Err(SolverError::Unsupported(format!(
                    "undeclared variable {}",
                    undeclared
                )));
            }
        }

        let domains = match Domains::propagate(problem) {
            Ok(domains) => domains,
            Err(reason) => {
                tracing::trace!(reason = %reason, "interval propagation refuted problem");
                return Ok(SolveOutcome::Unsat);
            }
        };
        if DifferenceGraph::from_problem(problem).has_negative_cycle() {
            tracing::trace!("difference constraints contain a negative cycle");
            return Ok(SolveOutcome::Unsat);
        }

        let mut complete = true;
        let mut slots: Vec<Slot<'_>> = problem
            .vars
            .iter()
            .map(|(name, sort)| {
                let (values, exhaustive) = candidates(&domains, name, *sort);
                complete &= exhaustive;
                Slot {
                    name: name.as_str(),
                    sort: *sort,
                    values,
                    checks: Vec::new(),
                }
            })
            .collect();

        let empty = Assignment::default();
        for assertion in &problem.assertions {
            let last = assertion
                .vars()
                .into_iter()
                .filter_map(|v| slots.iter().position(|s| s.name == v))
                .max();
            match last {
                Some(index) => slots[index].checks.push(assertion),
                None => match eval(assertion, &empty) {
                    Some(v) if v.truthy() => {}
                    Some(_) => return Ok(SolveOutcome::Unsat),
                    None => {
                        return Ok(SolveOutcome::Unknown(format!(
                            "ground assertion {} does not evaluate",
                            assertion
                        )))
                    }
                },
            }
        }

        let n = slots.len();
        let mut env = Assignment::default();
        let mut choice = vec![0usize; n];
        let mut level = 0usize;
        let mut steps = 0u64;
        let mut current: Vec<Vec<NativeValue>> = vec![Vec::new(); n];
        let mut fresh = true;

        loop {
            if level == n {
                let model: SolverModel = slots
                    .iter()
                    .filter_map(|slot| {
                        let value = env.get(slot.name)?;
                        Some((slot.name.to_string(), ModelValue::from_native(value)?))
                    })
                    .collect();
                return Ok(SolveOutcome::Sat(model));
            }

            if fresh {
                current[level] = expand(&slots[level], &env);
                fresh = false;
            }

            if choice[level] >= current[level].len() {
                if level == 0 {
                    break;
                }
                choice[level] = 0;
                level -= 1;
                env.remove(slots[level].name);
                choice[level] += 1;
                continue;
            }

            steps += 1;
            if steps % DEADLINE_POLL == 0 && deadline.is_expired() {
                return Err(timeout());
            }
            if steps > self.max_steps {
                return Ok(SolveOutcome::Unknown(format!(
                    "search gave up after {} steps",
                    self.max_steps
                )));
            }

            let slot = &slots[level];
            env.insert(slot.name, current[level][choice[level]].clone());
            if slot.checks.iter().all(|a| holds(a, &env)) {
                level += 1;
                fresh = true;
            } else {
                env.remove(slot.name);
                choice[level] += 1;
            }
        }

        if complete {
            Ok(SolveOutcome::Unsat)
        } else {
            Ok(SolveOutcome::Unknown(
                "no model among candidate values".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::{ArithOp, CmpOp};
    use std::time::Duration;

    fn solve(vars: &[(&str, Sort)], atoms: Vec<Term>) -> SolveOutcome {
        let mut p = Problem::new();
        for (name, sort) in vars {
            p.declare(*name, *sort);
        }
        for a in atoms {
            p.assert(a);
        }
        IntervalSolver::new().check(&p, &Deadline::never()).unwrap()
    }

    #[test]
    fn test_boundary_model() {
        let out = solve(
            &[("x", Sort::Int)],
            vec![Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(0))],
        );
        let SolveOutcome::Sat(model) = out else {
            panic!("expected sat, got {:?}", out);
        };
        assert_eq!(model.get("x"), Some(&ModelValue::Int(1)));
    }

    #[test]
    fn test_contradiction_is_unsat() {
        let out = solve(
            &[("x", Sort::Int)],
            vec![
                Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(0)),
                Term::cmp(CmpOp::Lt, Term::var("x"), Term::Int(0)),
            ],
        );
        assert_eq!(out, SolveOutcome::Unsat);
    }

    #[test]
    fn test_nonlinear_atom_found_by_search() {
        // x % 3 == 2 and x > 10
        let out = solve(
            &[("x", Sort::Int)],
            vec![
                Term::cmp(
                    CmpOp::Eq,
                    Term::arith(ArithOp::Mod, Term::var("x"), Term::Int(3)),
                    Term::Int(2),
                ),
                Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(10)),
            ],
        );
        assert_eq!(
            out,
            SolveOutcome::Sat(vec![("x".to_string(), ModelValue::Int(11))].into_iter().collect())
        );
    }

    #[test]
    fn test_relational_search() {
        let out = solve(
            &[("x", Sort::Int), ("y", Sort::Int)],
            vec![
                Term::cmp(CmpOp::Lt, Term::var("x"), Term::var("y")),
                Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(5)),
            ],
        );
        let SolveOutcome::Sat(model) = out else {
            panic!("expected sat");
        };
        let (Some(ModelValue::Int(x)), Some(ModelValue::Int(y))) = (model.get("x"), model.get("y")) else {
            panic!("missing ints");
        };
        assert!(x < y && *x > 5);
    }

    #[test]
    fn test_exhausted_bool_space_is_unsat() {
        // (a or b) and not a and not b, via a disjunction propagation cannot see
        let out = solve(
            &[("a", Sort::Bool), ("b", Sort::Bool)],
            vec![
                Term::or(vec![Term::var("a"), Term::var("b")]),
                Term::cmp(CmpOp::Eq, Term::var("a"), Term::var("b")),
                Term::Not(Box::new(Term::var("b"))),
            ],
        );
        assert_eq!(out, SolveOutcome::Unsat);
    }

    #[test]
    fn test_incomplete_search_is_unknown() {
        // x * x == 2 has no integer root
        let out = solve(
            &[("x", Sort::Int)],
            vec![Term::cmp(
                CmpOp::Eq,
                Term::arith(ArithOp::Mul, Term::var("x"), Term::var("x")),
                Term::Int(2),
            )],
        );
        assert!(matches!(out, SolveOutcome::Unknown(_)));
    }

    #[test]
    fn test_expired_deadline_times_out() {
        let mut p = Problem::new();
        p.declare("x", Sort::Int);
        let deadline = Deadline::after(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(1));
        assert!(matches!(
            IntervalSolver::new().check(&p, &deadline),
            Err(SolverError::Timeout { .. })
        ));
    }

    #[test]
    fn test_string_model() {
        let out = solve(
            &[("email", Sort::Str)],
            vec![
                Term::Contains {
                    haystack: Box::new(Term::var("email")),
                    needle: Box::new(Term::Str("@".into())),
                },
                Term::cmp(
                    CmpOp::Gt,
                    Term::StrLen(Box::new(Term::var("email"))),
                    Term::Int(5),
                ),
            ],
        );
        let SolveOutcome::Sat(model) = out else {
            panic!("expected sat");
        };
        let Some(ModelValue::Str(s)) = model.get("email") else {
            panic!("missing string");
        };
        assert!(s.contains('@') && s.chars().count() > 5);
    }
}
