//! Path conditions

use super::branch::BranchId;
use crate::features::parsing::domain::Expr;
use crate::shared::SymbolicType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix shared by names the engine invents (opaque call results, loop
/// iteration elements, exception switches); never a test input
pub const HIDDEN_PREFIX: &str = "__";

pub fn is_hidden_symbol(name: &str) -> bool {
    name.starts_with(HIDDEN_PREFIX)
}

/// Constraint contributed by one branch outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCondition {
    /// Branch expression over parameters and opaque symbols only
    pub expr: Expr,
    pub polarity: bool,
    pub branch: BranchId,
    pub ty: SymbolicType,
}

impl PathCondition {
    pub fn new(expr: Expr, polarity: bool, branch: BranchId, ty: SymbolicType) -> Self {
        Self {
            expr,
            polarity,
            branch,
            ty,
        }
    }

    /// Expression that holds on this path
    pub fn effective(&self) -> Expr {
        if self.polarity {
            self.expr.clone()
        } else {
            self.expr.negated()
        }
    }
}

impl fmt::Display for PathCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.effective())
    }
}

fn rank(ty: SymbolicType) -> u8 {
    match ty {
        SymbolicType::Bool => 0,
        SymbolicType::Int => 1,
        SymbolicType::Float => 2,
        SymbolicType::String => 3,
        SymbolicType::List => 4,
        SymbolicType::Dict => 5,
    }
}

fn widen(current: &mut Option<SymbolicType>, ty: SymbolicType) {
    if current.map_or(true, |c| rank(ty) > rank(c)) {
        *current = Some(ty);
    }
}

fn visit(expr: &Expr, symbols: &BTreeMap<String, SymbolicType>, out: &mut Option<SymbolicType>) {
    match expr {
        Expr::Name(n) => {
            if is_hidden_symbol(n) {
                // opaque values carry no declared type
                if let Some(ty @ (SymbolicType::Bool | SymbolicType::List | SymbolicType::Dict)) =
                    symbols.get(n).copied()
                {
                    widen(out, ty);
                }
            } else {
                widen(out, symbols.get(n).copied().unwrap_or(SymbolicType::Int));
            }
        }
        Expr::Int(_) => widen(out, SymbolicType::Int),
        Expr::Float(_) => widen(out, SymbolicType::Float),
        Expr::Str(_) => widen(out, SymbolicType::String),
        Expr::Bool(_) | Expr::None | Expr::Opaque(_) => {}
        Expr::List(items) => {
            widen(out, SymbolicType::List);
            items.iter().for_each(|i| visit(i, symbols, out));
        }
        Expr::Dict(entries) => {
            widen(out, SymbolicType::Dict);
            for (k, v) in entries {
                visit(k, symbols, out);
                visit(v, symbols, out);
            }
        }
        Expr::Compare { left, right, .. }
        | Expr::Logical { left, right, .. }
        | Expr::Arith { left, right, .. } => {
            visit(left, symbols, out);
            visit(right, symbols, out);
        }
        Expr::Not(inner) | Expr::Neg(inner) | Expr::Len(inner) => visit(inner, symbols, out),
        Expr::Call { args, .. } => args.iter().for_each(|a| visit(a, symbols, out)),
    }
}

/// Type tag of a condition: the widest type it touches, ranked
/// dict > list > string > float > int > bool
pub fn condition_type(expr: &Expr, symbols: &BTreeMap<String, SymbolicType>) -> SymbolicType {
    let mut out = None;
    visit(expr, symbols, &mut out);
    out.unwrap_or(SymbolicType::Bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::CmpOp;

    fn symbols() -> BTreeMap<String, SymbolicType> {
        BTreeMap::from([
            ("x".to_string(), SymbolicType::Int),
            ("flag".to_string(), SymbolicType::Bool),
            ("config".to_string(), SymbolicType::Dict),
            ("__call_fetch_0".to_string(), SymbolicType::Int),
        ])
    }

    #[test]
    fn test_widest_type_wins() {
        let e = Expr::and(
            Expr::name("flag"),
            Expr::compare(CmpOp::In, Expr::str("k"), Expr::name("config")),
        );
        assert_eq!(condition_type(&e, &symbols()), SymbolicType::Dict);
        assert_eq!(condition_type(&Expr::name("flag"), &symbols()), SymbolicType::Bool);
        assert_eq!(
            condition_type(&Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(1)), &symbols()),
            SymbolicType::Int
        );
    }

    #[test]
    fn test_opaque_symbol_typed_by_literal() {
        let e = Expr::compare(CmpOp::Eq, Expr::name("__call_fetch_0"), Expr::str("ok"));
        assert_eq!(condition_type(&e, &symbols()), SymbolicType::String);
    }

    #[test]
    fn test_effective_negates_false_polarity() {
        let c = PathCondition::new(
            Expr::compare(CmpOp::Gt, Expr::name("x"), Expr::int(10)),
            false,
            0,
            SymbolicType::Int,
        );
        assert_eq!(c.to_string(), "x <= 10");
    }
}
