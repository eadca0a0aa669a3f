//! Boundary values for free parameters
//!
//! A parameter the current path never constrains still needs a value. The
//! planner looks at the first comparison against a literal anywhere in the
//! function's paths and picks the value just inside it (`y > k` gives `k+1`),
//! with the value just outside kept for callers that want to violate it.
//! Offsets are fixed, so the choice is deterministic.

use crate::features::parsing::domain::{CmpOp, Expr};
use crate::features::symbolic::domain::{is_hidden_symbol, FeasibilityReport};
use crate::shared::NativeValue;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryValue {
    pub satisfy: NativeValue,
    pub violate: NativeValue,
}

#[derive(Debug, Clone, Default)]
pub struct BoundaryPlanner {
    scalars: BTreeMap<String, BoundaryValue>,
    /// Keyed by container name; values are lengths
    lengths: BTreeMap<String, BoundaryValue>,
}

impl BoundaryPlanner {
    pub fn from_report(report: &FeasibilityReport) -> Self {
        let mut planner = Self::default();
        let mut paths: Vec<_> = report.paths.iter().collect();
        paths.sort_by_key(|p| p.path.id());
        for p in paths {
            for c in p.path.conditions() {
                planner.observe(&c.expr);
            }
        }
        planner
    }

    pub fn observe(&mut self, e: &Expr) {
        match e {
            Expr::Compare { op, left, right } => {
                self.observe_compare(*op, left, right);
                if let Some(flipped) = op.flip() {
                    self.observe_compare(flipped, right, left);
                }
            }
            Expr::Logical { left, right, .. } => {
                self.observe(left);
                self.observe(right);
            }
            Expr::Not(inner) => self.observe(inner),
            _ => {}
        }
    }

    fn observe_compare(&mut self, op: CmpOp, subject: &Expr, bound: &Expr) {
        let Some(value) = boundary(op, bound) else {
            return;
        };
        match subject {
            Expr::Name(n) if !is_hidden_symbol(n) => {
                self.scalars.entry(n.clone()).or_insert(value);
            }
            Expr::Len(inner) => {
                if let Expr::Name(n) = inner.as_ref() {
                    if !is_hidden_symbol(n) && matches!(bound, Expr::Int(_)) {
                        self.lengths.entry(n.clone()).or_insert(value);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn scalar(&self, name: &str) -> Option<&BoundaryValue> {
        self.scalars.get(name)
    }

    /// Length that satisfies the first `len(name)` comparison
    pub fn length(&self, name: &str) -> Option<usize> {
        match self.lengths.get(name).map(|b| &b.satisfy) {
            Some(NativeValue::Int(n)) => Some(usize::try_from(*n).unwrap_or(0)),
            _ => None,
        }
    }
}

fn boundary(op: CmpOp, bound: &Expr) -> Option<BoundaryValue> {
    let (satisfy, violate) = match bound {
        Expr::Int(k) => {
            let (up, down) = (NativeValue::Int(k.saturating_add(1)), NativeValue::Int(k.saturating_sub(1)));
            let at = NativeValue::Int(*k);
            match op {
                CmpOp::Gt => (up, at),
                CmpOp::Ge => (at, down),
                CmpOp::Lt => (down, at),
                CmpOp::Le => (at, up),
                CmpOp::Eq => (at, up),
                CmpOp::Ne => (up, at),
                CmpOp::In | CmpOp::NotIn => return None,
            }
        }
        Expr::Float(k) => {
            let (up, down) = (NativeValue::Float(k + 1.0), NativeValue::Float(k - 1.0));
            let at = NativeValue::Float(*k);
            match op {
                CmpOp::Gt => (up, at),
                CmpOp::Ge => (at, down),
                CmpOp::Lt => (down, at),
                CmpOp::Le => (at, up),
                CmpOp::Eq => (at, up),
                CmpOp::Ne => (up, at),
                CmpOp::In | CmpOp::NotIn => return None,
            }
        }
        Expr::Str(s) => {
            let other = NativeValue::Str(format!("{}_", s));
            let at = NativeValue::Str(s.clone());
            match op {
                CmpOp::Eq => (at, other),
                CmpOp::Ne => (other, at),
                _ => return None,
            }
        }
        Expr::Bool(b) => match op {
            CmpOp::Eq => (NativeValue::Bool(*b), NativeValue::Bool(!b)),
            CmpOp::Ne => (NativeValue::Bool(!b), NativeValue::Bool(*b)),
            _ => return None,
        },
        _ => return None,
    };
    Some(BoundaryValue { satisfy, violate })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_comparison_wins() {
        let mut planner = BoundaryPlanner::default();
        planner.observe(&Expr::compare(CmpOp::Gt, Expr::name("y"), Expr::int(7)));
        planner.observe(&Expr::compare(CmpOp::Lt, Expr::name("y"), Expr::int(0)));
        let b = planner.scalar("y").unwrap();
        assert_eq!(b.satisfy, NativeValue::Int(8));
        assert_eq!(b.violate, NativeValue::Int(7));
    }

    #[test]
    fn test_literal_on_left_is_flipped() {
        let mut planner = BoundaryPlanner::default();
        planner.observe(&Expr::compare(CmpOp::Le, Expr::int(5), Expr::name("n")));
        assert_eq!(planner.scalar("n").unwrap().satisfy, NativeValue::Int(5));
    }

    #[test]
    fn test_length_boundaries() {
        let mut planner = BoundaryPlanner::default();
        planner.observe(&Expr::compare(
            CmpOp::Gt,
            Expr::len(Expr::name("items")),
            Expr::int(2),
        ));
        assert_eq!(planner.length("items"), Some(3));
        assert!(planner.scalar("items").is_none());
    }

    #[test]
    fn test_hidden_symbols_are_ignored() {
        let mut planner = BoundaryPlanner::default();
        planner.observe(&Expr::compare(CmpOp::Gt, Expr::name("__call_f_0"), Expr::int(1)));
        assert!(planner.scalar("__call_f_0").is_none());
    }
}
