//! Solver term language
//!
//! What the adapter hands to a backend: a conjunction of boolean terms over
//! declared, sorted variables. Container lengths and membership facts are
//! already flattened into plain int/bool variables at this level.

use crate::features::parsing::domain::{ArithOp, CmpOp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Variable sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Int,
    Real,
    Bool,
    Str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Int(i64),
    Real(f64),
    Bool(bool),
    Str(String),
    Var(String),
    StrLen(Box<Term>),
    Arith {
        op: ArithOp,
        left: Box<Term>,
        right: Box<Term>,
    },
    Neg(Box<Term>),
    /// Relational comparison; membership is expressed with `Contains` or
    /// disjunctions instead
    Cmp {
        op: CmpOp,
        left: Box<Term>,
        right: Box<Term>,
    },
    /// Substring test
    Contains {
        haystack: Box<Term>,
        needle: Box<Term>,
    },
    And(Vec<Term>),
    Or(Vec<Term>),
    Not(Box<Term>),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn cmp(op: CmpOp, left: Term, right: Term) -> Self {
        Term::Cmp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn arith(op: ArithOp, left: Term, right: Term) -> Self {
        Term::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Flattening conjunction
    pub fn and(terms: Vec<Term>) -> Self {
        let mut out = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Term::Bool(true) => {}
                Term::Bool(false) => return Term::Bool(false),
                Term::And(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Term::Bool(true),
            1 => out.pop().unwrap_or(Term::Bool(true)),
            _ => Term::And(out),
        }
    }

    /// Flattening disjunction
    pub fn or(terms: Vec<Term>) -> Self {
        let mut out = Vec::with_capacity(terms.len());
        for t in terms {
            match t {
                Term::Bool(false) => {}
                Term::Bool(true) => return Term::Bool(true),
                Term::Or(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        match out.len() {
            0 => Term::Bool(false),
            1 => out.pop().unwrap_or(Term::Bool(false)),
            _ => Term::Or(out),
        }
    }

    /// Negation pushed through comparisons and connectives
    pub fn not(term: Term) -> Self {
        match term {
            Term::Bool(b) => Term::Bool(!b),
            Term::Not(inner) => *inner,
            Term::Cmp { op, left, right } => Term::Cmp {
                op: op.negate(),
                left,
                right,
            },
            Term::And(terms) => Term::or(terms.into_iter().map(Term::not).collect()),
            Term::Or(terms) => Term::and(terms.into_iter().map(Term::not).collect()),
            other => Term::Not(Box::new(other)),
        }
    }

    /// Variable names, in first-occurrence order
    pub fn vars(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Term::Var(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Term::Int(_) | Term::Real(_) | Term::Bool(_) | Term::Str(_) => {}
            Term::StrLen(t) | Term::Neg(t) | Term::Not(t) => t.collect_vars(out),
            Term::Arith { left, right, .. } | Term::Cmp { left, right, .. } => {
                left.collect_vars(out);
                right.collect_vars(out);
            }
            Term::Contains { haystack, needle } => {
                haystack.collect_vars(out);
                needle.collect_vars(out);
            }
            Term::And(ts) | Term::Or(ts) => ts.iter().for_each(|t| t.collect_vars(out)),
        }
    }
}

/// S-expression rendering; also the canonical form used for cache keys
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, head: &str, ts: &[Term]) -> fmt::Result {
            write!(f, "({}", head)?;
            for t in ts {
                write!(f, " {}", t)?;
            }
            f.write_str(")")
        }

        match self {
            Term::Int(v) => write!(f, "{}", v),
            Term::Real(v) => write!(f, "{:?}", v),
            Term::Bool(v) => write!(f, "{}", v),
            Term::Str(v) => write!(f, "{:?}", v),
            Term::Var(n) => write!(f, "|{}|", n),
            Term::StrLen(t) => write!(f, "(str.len {})", t),
            Term::Arith { op, left, right } => write!(f, "({} {} {})", op.symbol(), left, right),
            Term::Neg(t) => write!(f, "(- {})", t),
            Term::Cmp { op, left, right } => write!(f, "({} {} {})", op.symbol(), left, right),
            Term::Contains { haystack, needle } => {
                write!(f, "(str.contains {} {})", haystack, needle)
            }
            Term::And(ts) => list(f, "and", ts),
            Term::Or(ts) => list(f, "or", ts),
            Term::Not(t) => write!(f, "(not {})", t),
        }
    }
}

/// A conjunction of assertions over declared variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    pub vars: BTreeMap<String, Sort>,
    pub assertions: Vec<Term>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable; the first declaration wins
    pub fn declare(&mut self, name: impl Into<String>, sort: Sort) {
        self.vars.entry(name.into()).or_insert(sort);
    }

    pub fn assert(&mut self, term: Term) {
        match term {
            Term::And(ts) => self.assertions.extend(ts),
            other => self.assertions.push(other),
        }
    }

    pub fn sort_of(&self, name: &str) -> Option<Sort> {
        self.vars.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_pushes_through_connectives() {
        let t = Term::and(vec![
            Term::cmp(CmpOp::Gt, Term::var("x"), Term::Int(0)),
            Term::cmp(CmpOp::Lt, Term::var("y"), Term::Int(5)),
        ]);
        assert_eq!(Term::not(t).to_string(), "(or (<= |x| 0) (>= |y| 5))");
    }

    #[test]
    fn test_and_flattens_and_short_circuits() {
        assert_eq!(Term::and(vec![Term::Bool(true), Term::Bool(true)]), Term::Bool(true));
        assert_eq!(
            Term::and(vec![Term::var("a"), Term::Bool(false)]),
            Term::Bool(false)
        );
        assert_eq!(Term::and(vec![Term::var("a")]), Term::var("a"));
    }

    #[test]
    fn test_problem_assert_splits_conjunctions() {
        let mut p = Problem::new();
        p.declare("x", Sort::Int);
        p.declare("x", Sort::Bool);
        p.assert(Term::and(vec![Term::var("a"), Term::var("b")]));
        assert_eq!(p.assertions.len(), 2);
        assert_eq!(p.sort_of("x"), Some(Sort::Int));
    }
}
