//! Term evaluation under a (partial) assignment

use crate::features::parsing::domain::semantics;
use crate::features::smt::domain::Term;
use crate::shared::NativeValue;
use rustc_hash::FxHashMap;

pub type Assignment<'a> = FxHashMap<&'a str, NativeValue>;

/// `None` when a variable is unassigned or the operation would raise
pub fn eval(term: &Term, env: &Assignment<'_>) -> Option<NativeValue> {
    match term {
        Term::Int(v) => Some(NativeValue::Int(*v)),
        Term::Real(v) => Some(NativeValue::Float(*v)),
        Term::Bool(v) => Some(NativeValue::Bool(*v)),
        Term::Str(v) => Some(NativeValue::Str(v.clone())),
        Term::Var(name) => env.get(name.as_str()).cloned(),
        Term::StrLen(t) => match eval(t, env)? {
            NativeValue::Str(s) => Some(NativeValue::Int(s.chars().count() as i64)),
            _ => None,
        },
        Term::Arith { op, left, right } => semantics::arith(*op, &eval(left, env)?, &eval(right, env)?),
        Term::Neg(t) => semantics::negate(&eval(t, env)?),
        Term::Cmp { op, left, right } => {
            semantics::compare(*op, &eval(left, env)?, &eval(right, env)?).map(NativeValue::Bool)
        }
        Term::Contains { haystack, needle } => {
            semantics::contains(&eval(haystack, env)?, &eval(needle, env)?).map(NativeValue::Bool)
        }
        Term::And(ts) => {
            for t in ts {
                if !eval(t, env)?.truthy() {
                    return Some(NativeValue::Bool(false));
                }
            }
            Some(NativeValue::Bool(true))
        }
        Term::Or(ts) => {
            for t in ts {
                if eval(t, env)?.truthy() {
                    return Some(NativeValue::Bool(true));
                }
            }
            Some(NativeValue::Bool(false))
        }
        Term::Not(t) => Some(NativeValue::Bool(!eval(t, env)?.truthy())),
    }
}

/// True iff the term evaluates and is truthy
pub fn holds(term: &Term, env: &Assignment<'_>) -> bool {
    eval(term, env).is_some_and(|v| v.truthy())
}
