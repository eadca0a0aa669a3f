//! Constant folding over partially symbolic expressions
//!
//! Each helper receives already-substituted operands and folds only when the
//! operands are literals and the operation is defined on them. A Python error
//! (division by zero, mixed types) leaves the node symbolic.

use crate::features::parsing::domain::semantics;
use crate::features::parsing::domain::{ArithOp, CmpOp, Expr, LogicalOp};
use crate::shared::NativeValue;

pub fn literal(value: NativeValue) -> Expr {
    match value {
        NativeValue::None => Expr::None,
        NativeValue::Int(v) => Expr::Int(v),
        NativeValue::Float(v) => Expr::Float(v),
        NativeValue::Bool(v) => Expr::Bool(v),
        NativeValue::Str(v) => Expr::Str(v),
        NativeValue::List(items) => Expr::List(items.into_iter().map(literal).collect()),
        NativeValue::Dict(entries) => Expr::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (literal(k), literal(v)))
                .collect(),
        ),
    }
}

/// Truthiness of a literal, `None` for anything symbolic
pub fn truth(e: &Expr) -> Option<bool> {
    e.as_literal().map(|v| v.truthy())
}

pub fn compare(op: CmpOp, left: Expr, right: Expr) -> Expr {
    if let (Some(l), Some(r)) = (left.as_literal(), right.as_literal()) {
        if let Some(b) = semantics::compare(op, &l, &r) {
            return Expr::Bool(b);
        }
    }
    Expr::compare(op, left, right)
}

/// Short-circuits on a literal left operand, returning the operand Python
/// would return
pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    match (op, truth(&left)) {
        (LogicalOp::And, Some(true)) | (LogicalOp::Or, Some(false)) => right,
        (LogicalOp::And, Some(false)) | (LogicalOp::Or, Some(true)) => left,
        (LogicalOp::And, None) => Expr::and(left, right),
        (LogicalOp::Or, None) => Expr::or(left, right),
    }
}

pub fn not(inner: Expr) -> Expr {
    match truth(&inner) {
        Some(b) => Expr::Bool(!b),
        None => inner.negated(),
    }
}

pub fn arith(op: ArithOp, left: Expr, right: Expr) -> Expr {
    if let (Some(l), Some(r)) = (left.as_literal(), right.as_literal()) {
        if let Some(v) = semantics::arith(op, &l, &r) {
            return literal(v);
        }
    }
    Expr::arith(op, left, right)
}

pub fn neg(inner: Expr) -> Expr {
    match inner.as_literal().and_then(|v| semantics::negate(&v)) {
        Some(v) => literal(v),
        None => Expr::Neg(Box::new(inner)),
    }
}

pub fn len(inner: Expr) -> Expr {
    match inner.as_literal().and_then(|v| v.len()) {
        Some(n) => Expr::Int(n as i64),
        None => match &inner {
            // a literal list of symbols still has a known length
            Expr::List(items) => Expr::Int(items.len() as i64),
            Expr::Dict(entries) => Expr::Int(entries.len() as i64),
            _ => Expr::len(inner),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_folds_literals() {
        assert_eq!(compare(CmpOp::Lt, Expr::int(1), Expr::int(2)), Expr::Bool(true));
        let symbolic = compare(CmpOp::Lt, Expr::name("x"), Expr::int(2));
        assert_eq!(symbolic.to_string(), "x < 2");
    }

    #[test]
    fn test_division_by_zero_stays_symbolic() {
        let e = arith(ArithOp::Div, Expr::int(1), Expr::int(0));
        assert!(matches!(e, Expr::Arith { .. }));
    }

    #[test]
    fn test_logical_short_circuit_returns_operand() {
        assert_eq!(logical(LogicalOp::Or, Expr::int(0), Expr::name("y")), Expr::name("y"));
        assert_eq!(logical(LogicalOp::And, Expr::int(0), Expr::name("y")), Expr::int(0));
    }

    #[test]
    fn test_not_pushes_into_comparison() {
        let e = not(Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(0)));
        assert_eq!(e.to_string(), "x <= 0");
        assert_eq!(not(Expr::str("")), Expr::Bool(true));
    }

    #[test]
    fn test_len_of_symbolic_list_literal() {
        assert_eq!(len(Expr::List(vec![Expr::name("a"), Expr::name("b")])), Expr::int(2));
        assert_eq!(len(Expr::name("xs")).to_string(), "len(xs)");
    }
}
