//! Path conditions to solver terms
//!
//! Scalars map to sorted variables. Containers are never modelled directly:
//! `len(c)` becomes an int variable named `len(c)` and `k in c` a bool variable
//! named `in(c,k)` implying `len(c) >= 1`. The side tables let the test
//! synthesizer rebuild a concrete container from the model.

use crate::features::parsing::domain::{ArithOp, CmpOp, Expr, LogicalOp};
use crate::features::smt::domain::{Problem, SolverError, Sort, Term};
use crate::features::symbolic::domain::{is_hidden_symbol, SymbolicPath};
use crate::shared::SymbolicType;
use std::collections::BTreeMap;

/// Membership fact over a container symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub var: String,
    pub container: String,
    pub needle: Expr,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    pub problem: Problem,
    /// `(length variable, container symbol)`
    pub lengths: Vec<(String, String)>,
    pub memberships: Vec<Membership>,
}

impl Translation {
    pub fn length_var(&self, container: &str) -> Option<&str> {
        self.lengths
            .iter()
            .find(|(_, c)| c == container)
            .map(|(v, _)| v.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar(Sort),
    Container,
}

fn shape_of(ty: SymbolicType) -> Shape {
    match ty {
        SymbolicType::Int => Shape::Scalar(Sort::Int),
        SymbolicType::Float => Shape::Scalar(Sort::Real),
        SymbolicType::Bool => Shape::Scalar(Sort::Bool),
        SymbolicType::String => Shape::Scalar(Sort::Str),
        SymbolicType::List | SymbolicType::Dict => Shape::Container,
    }
}

fn literal_sort(e: &Expr) -> Option<Sort> {
    match e {
        Expr::Int(_) => Some(Sort::Int),
        Expr::Float(_) => Some(Sort::Real),
        Expr::Bool(_) => Some(Sort::Bool),
        Expr::Str(_) => Some(Sort::Str),
        _ => None,
    }
}

fn unsupported(what: impl Into<String>) -> SolverError {
    SolverError::Unsupported(what.into())
}

type TResult<T> = Result<T, SolverError>;

struct Translator {
    shapes: BTreeMap<String, Shape>,
    out: Translation,
}

/// Translate the conjunction of a path's effective conditions
pub fn translate(path: &SymbolicPath) -> TResult<Translation> {
    let mut t = Translator {
        shapes: path
            .symbols()
            .iter()
            .map(|(name, ty)| (name.clone(), shape_of(*ty)))
            .collect(),
        out: Translation::default(),
    };
    for c in path.conditions() {
        t.infer_opaque(&c.expr);
    }
    for c in path.conditions() {
        let term = t.truth(&c.effective())?;
        t.out.problem.assert(term);
    }
    Ok(t.out)
}

impl Translator {
    fn refine(&mut self, name: &str, shape: Shape) {
        if !is_hidden_symbol(name) {
            return;
        }
        let slot = self
            .shapes
            .entry(name.to_string())
            .or_insert(Shape::Scalar(Sort::Int));
        if *slot == Shape::Scalar(Sort::Int) {
            *slot = shape;
        }
    }

    /// Opaque values default to int; let their usage say otherwise
    fn infer_opaque(&mut self, e: &Expr) {
        match e {
            Expr::Compare { op, left, right } => {
                match (left.as_ref(), right.as_ref()) {
                    (_, Expr::Name(h)) if matches!(op, CmpOp::In | CmpOp::NotIn) => {
                        self.refine(h, Shape::Container)
                    }
                    (Expr::Name(h), lit) | (lit, Expr::Name(h)) => {
                        if let Some(sort) = literal_sort(lit) {
                            self.refine(h, Shape::Scalar(sort));
                        }
                    }
                    _ => {}
                }
                self.infer_opaque(left);
                self.infer_opaque(right);
            }
            Expr::Len(inner) => {
                if let Expr::Name(h) = inner.as_ref() {
                    self.refine(h, Shape::Container);
                }
            }
            Expr::Logical { left, right, .. } | Expr::Arith { left, right, .. } => {
                self.infer_opaque(left);
                self.infer_opaque(right);
            }
            Expr::Not(inner) | Expr::Neg(inner) => self.infer_opaque(inner),
            _ => {}
        }
    }

    fn shape(&mut self, name: &str) -> Shape {
        *self
            .shapes
            .entry(name.to_string())
            .or_insert(Shape::Scalar(Sort::Int))
    }

    fn scalar_var(&mut self, name: &str, sort: Sort) -> Term {
        self.out.problem.declare(name, sort);
        Term::var(name)
    }

    fn len_var(&mut self, container: &str) -> Term {
        let name = format!("len({})", container);
        if self.out.length_var(container).is_none() {
            self.out.problem.declare(name.clone(), Sort::Int);
            self.out
                .problem
                .assert(Term::cmp(CmpOp::Ge, Term::var(name.clone()), Term::Int(0)));
            self.out.lengths.push((name.clone(), container.to_string()));
        }
        Term::var(name)
    }

    fn truth_of_sorted(term: Term, sort: Sort) -> Term {
        match sort {
            Sort::Bool => term,
            Sort::Int => Term::cmp(CmpOp::Ne, term, Term::Int(0)),
            Sort::Real => Term::cmp(CmpOp::Ne, term, Term::Real(0.0)),
            Sort::Str => Term::cmp(CmpOp::Ne, term, Term::Str(String::new())),
        }
    }

    fn truth(&mut self, e: &Expr) -> TResult<Term> {
        match e {
            Expr::Bool(b) => Ok(Term::Bool(*b)),
            Expr::Name(n) => match self.shape(n) {
                Shape::Scalar(sort) => {
                    let var = self.scalar_var(n, sort);
                    Ok(Self::truth_of_sorted(var, sort))
                }
                Shape::Container => Ok(Term::cmp(CmpOp::Gt, self.len_var(n), Term::Int(0))),
            },
            Expr::Not(inner) => Ok(Term::not(self.truth(inner)?)),
            Expr::Logical { op, left, right } => {
                let terms = vec![self.truth(left)?, self.truth(right)?];
                Ok(match op {
                    LogicalOp::And => Term::and(terms),
                    LogicalOp::Or => Term::or(terms),
                })
            }
            Expr::Compare { op, left, right } => self.compare(*op, left, right),
            Expr::Len(inner) => Ok(Term::cmp(CmpOp::Ne, self.length(inner)?, Term::Int(0))),
            Expr::Arith { .. } | Expr::Neg(_) => {
                let (term, sort) = self.value(e)?;
                Ok(Self::truth_of_sorted(term, sort))
            }
            other => match other.as_literal() {
                Some(v) => Ok(Term::Bool(v.truthy())),
                None => Err(unsupported(format!("cannot decide truth of {}", other))),
            },
        }
    }

    fn compare(&mut self, op: CmpOp, left: &Expr, right: &Expr) -> TResult<Term> {
        match op {
            CmpOp::In => return self.membership(left, right),
            CmpOp::NotIn => return Ok(Term::not(self.membership(left, right)?)),
            _ => {}
        }

        if matches!(left, Expr::None) || matches!(right, Expr::None) {
            // typed inputs are never None
            return match op {
                CmpOp::Ne => Ok(Term::Bool(true)),
                _ => Err(unsupported("comparison with None")),
            };
        }

        // `c == []` style emptiness checks on containers
        for (side, other) in [(left, right), (right, left)] {
            if let (Expr::Name(n), Expr::List(items)) = (side, other) {
                if items.is_empty() && self.shape(n) == Shape::Container {
                    let len = self.len_var(n);
                    return match op {
                        CmpOp::Eq => Ok(Term::cmp(CmpOp::Eq, len, Term::Int(0))),
                        CmpOp::Ne => Ok(Term::cmp(CmpOp::Gt, len, Term::Int(0))),
                        _ => Err(unsupported("ordering on containers")),
                    };
                }
            }
        }

        let (lt, ls) = self.value(left)?;
        let (rt, rs) = self.value(right)?;
        let textual = |s: Sort| s == Sort::Str;
        if textual(ls) != textual(rs) {
            return match op {
                CmpOp::Eq => Ok(Term::Bool(false)),
                CmpOp::Ne => Ok(Term::Bool(true)),
                _ => Err(unsupported("ordering between str and number")),
            };
        }
        Ok(Term::cmp(op, lt, rt))
    }

    fn value(&mut self, e: &Expr) -> TResult<(Term, Sort)> {
        match e {
            Expr::Int(v) => Ok((Term::Int(*v), Sort::Int)),
            Expr::Float(v) => Ok((Term::Real(*v), Sort::Real)),
            Expr::Bool(v) => Ok((Term::Bool(*v), Sort::Bool)),
            Expr::Str(v) => Ok((Term::Str(v.clone()), Sort::Str)),
            Expr::Name(n) => match self.shape(n) {
                Shape::Scalar(sort) => Ok((self.scalar_var(n, sort), sort)),
                Shape::Container => Err(unsupported(format!("container value {}", n))),
            },
            Expr::Len(inner) => Ok((self.length(inner)?, Sort::Int)),
            Expr::Arith { op, left, right } => {
                let (lt, ls) = self.value(left)?;
                let (rt, rs) = self.value(right)?;
                let sort = if ls == Sort::Str || rs == Sort::Str {
                    Sort::Str
                } else if ls == Sort::Real || rs == Sort::Real || *op == ArithOp::Div {
                    Sort::Real
                } else {
                    Sort::Int
                };
                Ok((Term::arith(*op, lt, rt), sort))
            }
            Expr::Neg(inner) => {
                let (t, s) = self.value(inner)?;
                let sort = if s == Sort::Real { Sort::Real } else { Sort::Int };
                Ok((Term::Neg(Box::new(t)), sort))
            }
            Expr::Compare { .. } | Expr::Logical { .. } | Expr::Not(_) => {
                Ok((self.truth(e)?, Sort::Bool))
            }
            other => Err(unsupported(format!("value {}", other))),
        }
    }

    fn length(&mut self, e: &Expr) -> TResult<Term> {
        match e {
            Expr::Name(n) => match self.shape(n) {
                Shape::Scalar(Sort::Str) => {
                    let var = self.scalar_var(n, Sort::Str);
                    Ok(Term::StrLen(Box::new(var)))
                }
                Shape::Container => Ok(self.len_var(n)),
                Shape::Scalar(_) => Err(unsupported(format!("len() of unsized {}", n))),
            },
            other => match other.as_literal().and_then(|v| v.len()) {
                Some(n) => Ok(Term::Int(n as i64)),
                None => Err(unsupported(format!("len({})", other))),
            },
        }
    }

    fn membership(&mut self, needle: &Expr, haystack: &Expr) -> TResult<Term> {
        match haystack {
            Expr::List(items) => {
                let mut alternatives = Vec::with_capacity(items.len());
                for item in items {
                    alternatives.push(self.compare(CmpOp::Eq, needle, item)?);
                }
                Ok(Term::or(alternatives))
            }
            Expr::Dict(entries) => {
                let mut alternatives = Vec::with_capacity(entries.len());
                for (key, _) in entries {
                    alternatives.push(self.compare(CmpOp::Eq, needle, key)?);
                }
                Ok(Term::or(alternatives))
            }
            Expr::Str(h) => {
                let (n, sort) = self.value(needle)?;
                if sort != Sort::Str {
                    return Err(unsupported("non-str needle in str"));
                }
                Ok(Term::Contains {
                    haystack: Box::new(Term::Str(h.clone())),
                    needle: Box::new(n),
                })
            }
            Expr::Name(h) => match self.shape(h) {
                Shape::Scalar(Sort::Str) => {
                    let (n, sort) = self.value(needle)?;
                    if sort != Sort::Str {
                        return Err(unsupported("non-str needle in str"));
                    }
                    let var = self.scalar_var(h, Sort::Str);
                    Ok(Term::Contains {
                        haystack: Box::new(var),
                        needle: Box::new(n),
                    })
                }
                Shape::Container => {
                    if !(needle.is_literal() || matches!(needle, Expr::Name(_))) {
                        return Err(unsupported(format!("membership test of {}", needle)));
                    }
                    let var = format!("in({},{})", h, needle);
                    if !self.out.memberships.iter().any(|m| m.var == var) {
                        self.out.problem.declare(var.clone(), Sort::Bool);
                        let len = self.len_var(h);
                        self.out.problem.assert(Term::or(vec![
                            Term::not(Term::var(var.clone())),
                            Term::cmp(CmpOp::Ge, len, Term::Int(1)),
                        ]));
                        self.out.memberships.push(Membership {
                            var: var.clone(),
                            container: h.clone(),
                            needle: needle.clone(),
                        });
                    }
                    Ok(Term::var(var))
                }
                Shape::Scalar(_) => Err(unsupported(format!("membership in unsized {}", h))),
            },
            other => Err(unsupported(format!("membership in {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::symbolic::domain::{PathCondition, Terminal};

    fn path(symbols: &[(&str, SymbolicType)], conditions: Vec<(Expr, bool)>) -> SymbolicPath {
        let symbols: BTreeMap<String, SymbolicType> =
            symbols.iter().map(|(n, t)| (n.to_string(), *t)).collect();
        let conditions = conditions
            .into_iter()
            .enumerate()
            .map(|(i, (e, p))| PathCondition::new(e, p, i as u32, SymbolicType::Int))
            .collect();
        SymbolicPath::new(0, conditions, vec![], 0, Terminal::FallThrough, symbols)
    }

    #[test]
    fn test_polarity_negates() {
        let p = path(
            &[("x", SymbolicType::Int)],
            vec![(Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(10)), false)],
        );
        let t = translate(&p).unwrap();
        assert_eq!(t.problem.assertions[0].to_string(), "(<= |x| 10)");
        assert_eq!(t.problem.sort_of("x"), Some(Sort::Int));
    }

    #[test]
    fn test_container_length_and_membership() {
        let p = path(
            &[("items", SymbolicType::List)],
            vec![
                (Expr::compare(CmpOp::Gt, Expr::len(Expr::name("items")), Expr::int(2)), true),
                (Expr::compare(CmpOp::In, Expr::int(7), Expr::name("items")), true),
            ],
        );
        let t = translate(&p).unwrap();
        assert_eq!(t.length_var("items"), Some("len(items)"));
        assert_eq!(t.memberships.len(), 1);
        assert_eq!(t.memberships[0].var, "in(items,7)");
        assert_eq!(t.problem.sort_of("in(items,7)"), Some(Sort::Bool));
    }

    #[test]
    fn test_truthiness_by_type() {
        let p = path(
            &[("s", SymbolicType::String), ("n", SymbolicType::Int)],
            vec![(Expr::name("s"), true), (Expr::name("n"), false)],
        );
        let t = translate(&p).unwrap();
        let rendered: Vec<String> = t.problem.assertions.iter().map(|a| a.to_string()).collect();
        assert_eq!(rendered, vec!["(!= |s| \"\")", "(== |n| 0)"]);
    }

    #[test]
    fn test_opaque_symbol_sort_from_usage() {
        let p = path(
            &[("__call_fetch_0", SymbolicType::Int)],
            vec![(Expr::compare(CmpOp::Eq, Expr::name("__call_fetch_0"), Expr::str("ok")), true)],
        );
        let t = translate(&p).unwrap();
        assert_eq!(t.problem.sort_of("__call_fetch_0"), Some(Sort::Str));
    }

    #[test]
    fn test_none_comparison_is_unsupported() {
        let p = path(
            &[("x", SymbolicType::Int)],
            vec![(Expr::compare(CmpOp::Eq, Expr::name("x"), Expr::None), true)],
        );
        assert!(matches!(translate(&p), Err(SolverError::Unsupported(_))));
    }
}
