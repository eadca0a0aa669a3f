//! Interval propagation
//!
//! Tracks a closed integer interval (plus excluded points) per int variable,
//! bounds for reals, pinned values for bools and strings, and length bounds
//! and required substrings for strings. Only top-level atoms are propagated,
//! so a contradiction found here is a proof of unsatisfiability.

use crate::features::parsing::domain::CmpOp;
use crate::features::smt::domain::{Problem, Sort, Term};
use std::collections::{BTreeMap, BTreeSet};

/// Cap on generated candidates per variable
const MAX_CANDIDATES: usize = 48;

/// Finite intervals at most this wide are enumerated exhaustively
const ENUMERABLE_WIDTH: i128 = 64;

/// Closed integer interval `[lower, upper]`; `None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntInterval {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl Default for IntInterval {
    fn default() -> Self {
        Self::full()
    }
}

impl IntInterval {
    pub fn full() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            lower: Some(1),
            upper: Some(0),
        }
    }

    pub fn at_least(v: i64) -> Self {
        Self {
            lower: Some(v),
            upper: None,
        }
    }

    pub fn at_most(v: i64) -> Self {
        Self {
            lower: None,
            upper: Some(v),
        }
    }

    pub fn exactly(v: i64) -> Self {
        Self {
            lower: Some(v),
            upper: Some(v),
        }
    }

    /// Interval of `x` satisfying `x <op> k`; `None` when the operator does
    /// not describe an interval
    pub fn from_cmp(op: CmpOp, k: i64) -> Option<Self> {
        let interval = match op {
            CmpOp::Eq => Self::exactly(k),
            CmpOp::Le => Self::at_most(k),
            CmpOp::Ge => Self::at_least(k),
            CmpOp::Lt => k.checked_sub(1).map_or_else(Self::empty, Self::at_most),
            CmpOp::Gt => k.checked_add(1).map_or_else(Self::empty, Self::at_least),
            CmpOp::Ne | CmpOp::In | CmpOp::NotIn => return None,
        };
        Some(interval)
    }

    /// Same for a real-valued bound on an integer variable
    pub fn from_real_cmp(op: CmpOp, r: f64) -> Option<Self> {
        if !r.is_finite() {
            return None;
        }
        let interval = match op {
            CmpOp::Eq if r.fract() == 0.0 => Self::exactly(r as i64),
            CmpOp::Eq => Self::empty(),
            CmpOp::Le => Self::at_most(r.floor() as i64),
            CmpOp::Lt => Self::at_most((r.ceil() as i64).saturating_sub(1)),
            CmpOp::Ge => Self::at_least(r.ceil() as i64),
            CmpOp::Gt => Self::at_least((r.floor() as i64).saturating_add(1)),
            CmpOp::Ne | CmpOp::In | CmpOp::NotIn => return None,
        };
        Some(interval)
    }

    pub fn intersect(&self, other: &IntInterval) -> IntInterval {
        let lower = match (self.lower, other.lower) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let upper = match (self.upper, other.upper) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        IntInterval { lower, upper }
    }

    pub fn is_empty(&self) -> bool {
        matches!((self.lower, self.upper), (Some(l), Some(u)) if l > u)
    }

    pub fn contains(&self, v: i64) -> bool {
        self.lower.map_or(true, |l| v >= l) && self.upper.map_or(true, |u| v <= u)
    }

    /// Number of members minus one, when finite
    pub fn width(&self) -> Option<i128> {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => Some(i128::from(u) - i128::from(l)),
            _ => None,
        }
    }
}

/// Real bounds with strictness
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealInterval {
    pub lower: f64,
    pub lower_strict: bool,
    pub upper: f64,
    pub upper_strict: bool,
}

impl Default for RealInterval {
    fn default() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            lower_strict: false,
            upper: f64::INFINITY,
            upper_strict: false,
        }
    }
}

impl RealInterval {
    fn raise_lower(&mut self, v: f64, strict: bool) {
        if v > self.lower || (v == self.lower && strict) {
            self.lower = v;
            self.lower_strict = strict;
        }
    }

    fn lower_upper(&mut self, v: f64, strict: bool) {
        if v < self.upper || (v == self.upper && strict) {
            self.upper = v;
            self.upper_strict = strict;
        }
    }

    fn tighten(&mut self, op: CmpOp, r: f64) {
        match op {
            CmpOp::Gt => self.raise_lower(r, true),
            CmpOp::Ge => self.raise_lower(r, false),
            CmpOp::Lt => self.lower_upper(r, true),
            CmpOp::Le => self.lower_upper(r, false),
            CmpOp::Eq => {
                self.raise_lower(r, false);
                self.lower_upper(r, false);
            }
            CmpOp::Ne | CmpOp::In | CmpOp::NotIn => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
            || (self.lower == self.upper && (self.lower_strict || self.upper_strict))
    }

    pub fn contains(&self, v: f64) -> bool {
        let above = if self.lower_strict { v > self.lower } else { v >= self.lower };
        let below = if self.upper_strict { v < self.upper } else { v <= self.upper };
        above && below
    }
}

#[derive(Debug, Clone, Default)]
struct IntDomain {
    interval: IntInterval,
    excluded: BTreeSet<i64>,
}

#[derive(Debug, Clone)]
struct StrDomain {
    pinned: Option<String>,
    excluded: BTreeSet<String>,
    len: IntInterval,
    needles: Vec<String>,
}

impl Default for StrDomain {
    fn default() -> Self {
        Self {
            pinned: None,
            excluded: BTreeSet::new(),
            len: IntInterval::at_least(0),
            needles: Vec::new(),
        }
    }
}

/// Candidate values for one variable; `complete` when they cover every value
/// the propagated domain allows
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates<T> {
    pub values: Vec<T>,
    pub complete: bool,
}

/// Per-variable domains after propagating every top-level atom
#[derive(Debug, Default)]
pub struct Domains {
    ints: BTreeMap<String, IntDomain>,
    reals: BTreeMap<String, RealInterval>,
    bools: BTreeMap<String, bool>,
    strs: BTreeMap<String, StrDomain>,
    int_consts: BTreeSet<i64>,
    real_consts: Vec<f64>,
    str_consts: BTreeSet<String>,
}

fn numeric(term: &Term) -> Option<f64> {
    match term {
        Term::Int(v) => Some(*v as f64),
        Term::Real(v) => Some(*v),
        Term::Bool(v) => Some(f64::from(u8::from(*v))),
        _ => None,
    }
}

impl Domains {
    /// Propagate; `Err` carries the reason the problem is unsatisfiable
    pub fn propagate(problem: &Problem) -> Result<Self, String> {
        let mut domains = Domains::default();
        for assertion in &problem.assertions {
            domains.collect_consts(assertion);
            domains.atom(assertion, problem)?;
        }
        domains.check()?;
        Ok(domains)
    }

    fn collect_consts(&mut self, term: &Term) {
        match term {
            Term::Int(v) => {
                self.int_consts.insert(*v);
            }
            Term::Real(v) => {
                if v.is_finite() && !self.real_consts.contains(v) {
                    self.real_consts.push(*v);
                }
            }
            Term::Str(s) => {
                self.str_consts.insert(s.clone());
            }
            Term::Bool(_) | Term::Var(_) => {}
            Term::StrLen(t) | Term::Neg(t) | Term::Not(t) => self.collect_consts(t),
            Term::Arith { left, right, .. } | Term::Cmp { left, right, .. } => {
                self.collect_consts(left);
                self.collect_consts(right);
            }
            Term::Contains { haystack, needle } => {
                self.collect_consts(haystack);
                self.collect_consts(needle);
            }
            Term::And(ts) | Term::Or(ts) => ts.iter().for_each(|t| self.collect_consts(t)),
        }
    }

    fn atom(&mut self, term: &Term, problem: &Problem) -> Result<(), String> {
        match term {
            Term::Bool(false) => Err("assertion is constant false".to_string()),
            Term::Var(b) if problem.sort_of(b) == Some(Sort::Bool) => self.pin_bool(b, true),
            Term::Not(inner) => match inner.as_ref() {
                Term::Var(b) if problem.sort_of(b) == Some(Sort::Bool) => self.pin_bool(b, false),
                _ => Ok(()),
            },
            Term::Contains { haystack, needle } => {
                if let (Term::Var(s), Term::Str(n)) = (haystack.as_ref(), needle.as_ref()) {
                    let domain = self.strs.entry(s.clone()).or_default();
                    if !domain.needles.contains(n) {
                        domain.needles.push(n.clone());
                    }
                }
                Ok(())
            }
            Term::Cmp { op, left, right } => match (left.as_ref(), right.as_ref()) {
                (Term::Var(x), c) if is_const(c) => self.bound(x, *op, c, problem),
                (c, Term::Var(x)) if is_const(c) => match op.flip() {
                    Some(flipped) => self.bound(x, flipped, c, problem),
                    None => Ok(()),
                },
                (Term::StrLen(s), Term::Int(k)) => self.len_bound(s, *op, *k),
                (Term::Int(k), Term::StrLen(s)) => match op.flip() {
                    Some(flipped) => self.len_bound(s, flipped, *k),
                    None => Ok(()),
                },
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn pin_bool(&mut self, name: &str, value: bool) -> Result<(), String> {
        match self.bools.insert(name.to_string(), value) {
            Some(previous) if previous != value => {
                Err(format!("{} must be both {} and {}", name, previous, value))
            }
            _ => Ok(()),
        }
    }

    fn len_bound(&mut self, s: &Term, op: CmpOp, k: i64) -> Result<(), String> {
        let Term::Var(name) = s else {
            return Ok(());
        };
        if let Some(iv) = IntInterval::from_cmp(op, k) {
            let domain = self.strs.entry(name.clone()).or_default();
            domain.len = domain.len.intersect(&iv);
        }
        Ok(())
    }

    fn bound(&mut self, x: &str, op: CmpOp, c: &Term, problem: &Problem) -> Result<(), String> {
        match (problem.sort_of(x), c) {
            (Some(Sort::Int), Term::Int(k)) => {
                let domain = self.ints.entry(x.to_string()).or_default();
                match IntInterval::from_cmp(op, *k) {
                    Some(iv) => domain.interval = domain.interval.intersect(&iv),
                    None if op == CmpOp::Ne => {
                        domain.excluded.insert(*k);
                    }
                    None => {}
                }
            }
            (Some(Sort::Int), Term::Real(r)) => {
                let domain = self.ints.entry(x.to_string()).or_default();
                match IntInterval::from_real_cmp(op, *r) {
                    Some(iv) => domain.interval = domain.interval.intersect(&iv),
                    None if op == CmpOp::Ne && r.fract() == 0.0 => {
                        domain.excluded.insert(*r as i64);
                    }
                    None => {}
                }
            }
            (Some(Sort::Real), c) => {
                if let Some(r) = numeric(c) {
                    self.reals.entry(x.to_string()).or_default().tighten(op, r);
                }
            }
            (Some(Sort::Bool), Term::Bool(b)) => match op {
                CmpOp::Eq => self.pin_bool(x, *b)?,
                CmpOp::Ne => self.pin_bool(x, !*b)?,
                _ => {}
            },
            (Some(Sort::Str), Term::Str(s)) => {
                let domain = self.strs.entry(x.to_string()).or_default();
                match op {
                    CmpOp::Eq => match &domain.pinned {
                        Some(previous) if previous != s => {
                            return Err(format!("{} must equal both {:?} and {:?}", x, previous, s))
                        }
                        _ => domain.pinned = Some(s.clone()),
                    },
                    CmpOp::Ne => {
                        domain.excluded.insert(s.clone());
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn check(&self) -> Result<(), String> {
        for (name, domain) in &self.ints {
            if domain.interval.is_empty() {
                return Err(format!("{} has an empty range", name));
            }
            if let (Some(l), Some(w)) = (domain.interval.lower, domain.interval.width()) {
                if w < ENUMERABLE_WIDTH
                    && (0..=w as i64).all(|off| domain.excluded.contains(&(l + off)))
                {
                    return Err(format!("every value of {} is excluded", name));
                }
            }
        }
        for (name, interval) in &self.reals {
            if interval.is_empty() {
                return Err(format!("{} has an empty range", name));
            }
        }
        for (name, domain) in &self.strs {
            if domain.len.is_empty() {
                return Err(format!("len({}) has an empty range", name));
            }
            if let Some(pinned) = &domain.pinned {
                if domain.excluded.contains(pinned) {
                    return Err(format!("{} is both equal and unequal to {:?}", name, pinned));
                }
                if !domain.len.contains(pinned.chars().count() as i64) {
                    return Err(format!("{:?} violates the length bounds on {}", pinned, name));
                }
                if let Some(n) = domain.needles.iter().find(|n| !pinned.contains(n.as_str())) {
                    return Err(format!("{:?} does not contain {:?}", pinned, n));
                }
            }
        }
        Ok(())
    }

    pub fn int_candidates(&self, name: &str) -> Candidates<i64> {
        let fallback = IntDomain::default();
        let domain = self.ints.get(name).unwrap_or(&fallback);
        interval_candidates(&domain.interval, &domain.excluded, &self.int_consts)
    }

    pub fn bool_candidates(&self, name: &str) -> Candidates<bool> {
        let values = match self.bools.get(name) {
            Some(b) => vec![*b],
            None => vec![true, false],
        };
        Candidates {
            values,
            complete: true,
        }
    }

    pub fn real_candidates(&self, name: &str) -> Candidates<f64> {
        let interval = self.reals.get(name).copied().unwrap_or_default();
        let mut raw = Vec::new();
        if interval.lower.is_finite() {
            raw.extend([interval.lower, interval.lower + 0.5, interval.lower + 1.0]);
        }
        if interval.upper.is_finite() {
            raw.extend([interval.upper, interval.upper - 0.5, interval.upper - 1.0]);
        }
        if interval.lower.is_finite() && interval.upper.is_finite() {
            raw.push((interval.lower + interval.upper) / 2.0);
        }
        raw.extend([0.0, 1.0, -1.0, 0.5]);
        for c in &self.real_consts {
            raw.extend([*c, c + 0.5, c - 0.5]);
        }
        for c in &self.int_consts {
            raw.extend([*c as f64, *c as f64 + 0.5]);
        }

        let mut values: Vec<f64> = Vec::new();
        for v in raw {
            if interval.contains(v) && !values.iter().any(|x| x.to_bits() == v.to_bits()) {
                values.push(v);
            }
        }
        values.truncate(MAX_CANDIDATES);
        Candidates {
            values,
            complete: false,
        }
    }

    pub fn str_candidates(&self, name: &str) -> Candidates<String> {
        let fallback = StrDomain::default();
        let domain = self.strs.get(name).unwrap_or(&fallback);
        if let Some(pinned) = &domain.pinned {
            return Candidates {
                values: vec![pinned.clone()],
                complete: true,
            };
        }

        let base: String = domain.needles.concat();
        let base_len = base.chars().count() as i64;
        let mut raw = vec![base.clone()];
        let lens = interval_candidates(&domain.len, &BTreeSet::new(), &self.int_consts);
        for n in lens.values {
            if n >= base_len && n <= 4096 {
                raw.push(format!("{}{}", base, "a".repeat((n - base_len) as usize)));
            }
        }
        for c in &self.str_consts {
            raw.push(c.clone());
            raw.push(format!("{}a", c));
            if !base.is_empty() {
                raw.push(format!("{}{}", base, c));
            }
        }
        raw.extend([String::new(), "a".to_string()]);

        let mut values: Vec<String> = Vec::new();
        for v in raw {
            if !domain.excluded.contains(&v)
                && domain.len.contains(v.chars().count() as i64)
                && !values.contains(&v)
            {
                values.push(v);
            }
        }
        values.truncate(MAX_CANDIDATES);
        Candidates {
            values,
            complete: false,
        }
    }
}

fn is_const(term: &Term) -> bool {
    matches!(term, Term::Int(_) | Term::Real(_) | Term::Bool(_) | Term::Str(_))
}

/// Boundary values first, so `x > k` yields `k + 1`
fn interval_candidates(
    interval: &IntInterval,
    excluded: &BTreeSet<i64>,
    consts: &BTreeSet<i64>,
) -> Candidates<i64> {
    let allowed = |v: &i64| interval.contains(*v) && !excluded.contains(v);

    if let (Some(l), Some(w)) = (interval.lower, interval.width()) {
        if w < ENUMERABLE_WIDTH {
            return Candidates {
                values: (0..=w as i64).map(|off| l + off).filter(allowed).collect(),
                complete: true,
            };
        }
    }

    let spread = excluded.len() as i64 + 3;
    let mut raw = Vec::new();
    if let Some(l) = interval.lower {
        raw.extend((0..spread).filter_map(|k| l.checked_add(k)));
    }
    if let Some(u) = interval.upper {
        raw.extend((0..spread).filter_map(|k| u.checked_sub(k)));
    }
    raw.extend([0, 1, -1, 2]);
    for c in consts {
        raw.push(*c);
        raw.extend(c.checked_add(1));
        raw.extend(c.checked_sub(1));
    }

    let mut values: Vec<i64> = Vec::new();
    for v in raw {
        if allowed(&v) && !values.contains(&v) {
            values.push(v);
        }
    }
    values.truncate(MAX_CANDIDATES);
    Candidates {
        values,
        complete: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_problem(atoms: Vec<Term>) -> Problem {
        let mut p = Problem::new();
        p.declare("x", Sort::Int);
        for a in atoms {
            p.assert(a);
        }
        p
    }

    #[test]
    fn test_interval_from_cmp() {
        assert_eq!(IntInterval::from_cmp(CmpOp::Gt, 5), Some(IntInterval::at_least(6)));
        assert_eq!(IntInterval::from_cmp(CmpOp::Lt, 5), Some(IntInterval::at_most(4)));
        assert_eq!(IntInterval::from_cmp(CmpOp::Ne, 5), None);
        assert!(IntInterval::from_cmp(CmpOp::Lt, i64::MIN).unwrap().is_empty());
    }

    #[test]
    fn test_real_bound_on_int() {
        assert_eq!(
            IntInterval::from_real_cmp(CmpOp::Gt, 2.5),
            Some(IntInterval::at_least(3))
        );
        assert_eq!(
            IntInterval::from_real_cmp(CmpOp::Lt, 2.0),
            Some(IntInterval::at_most(1))
        );
        assert!(IntInterval::from_real_cmp(CmpOp::Eq, 2.5).unwrap().is_empty());
    }

    #[test]
    fn test_contradiction_detected() {
        let p = int_problem(vec![
            Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(0)),
            Term::cmp(CmpOp::Lt, Term::var("x"), Term::Int(0)),
        ]);
        assert!(Domains::propagate(&p).is_err());
    }

    #[test]
    fn test_exclusions_exhaust_range() {
        let p = int_problem(vec![
            Term::cmp(CmpOp::Ge, Term::var("x"), Term::Int(1)),
            Term::cmp(CmpOp::Le, Term::var("x"), Term::Int(2)),
            Term::cmp(CmpOp::Ne, Term::var("x"), Term::Int(1)),
            Term::cmp(CmpOp::Ne, Term::Int(2), Term::var("x")),
        ]);
        assert!(Domains::propagate(&p).is_err());
    }

    #[test]
    fn test_boundary_candidate_first() {
        let p = int_problem(vec![Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(10))]);
        let domains = Domains::propagate(&p).unwrap();
        let candidates = domains.int_candidates("x");
        assert_eq!(candidates.values[0], 11);
        assert!(!candidates.complete);
    }

    #[test]
    fn test_string_domain() {
        let mut p = Problem::new();
        p.declare("s", Sort::Str);
        p.assert(Term::Contains {
            haystack: Box::new(Term::var("s")),
            needle: Box::new(Term::Str("@".into())),
        });
        p.assert(Term::cmp(
            CmpOp::Gt,
            Term::StrLen(Box::new(Term::var("s"))),
            Term::Int(3),
        ));
        let domains = Domains::propagate(&p).unwrap();
        let values = domains.str_candidates("s").values;
        assert!(values.iter().any(|v| v.contains('@') && v.chars().count() > 3));
    }

    #[test]
    fn test_pinned_string_conflicts() {
        let mut p = Problem::new();
        p.declare("s", Sort::Str);
        p.assert(Term::cmp(CmpOp::Eq, Term::var("s"), Term::Str("admin".into())));
        p.assert(Term::cmp(CmpOp::Ne, Term::var("s"), Term::Str("admin".into())));
        assert!(Domains::propagate(&p).is_err());
    }

    #[test]
    fn test_bool_pins_conflict() {
        let mut p = Problem::new();
        p.declare("flag", Sort::Bool);
        p.assert(Term::var("flag"));
        p.assert(Term::not(Term::var("flag")));
        assert!(Domains::propagate(&p).is_err());
    }
}
