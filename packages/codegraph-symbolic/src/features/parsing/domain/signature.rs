//! Parameter type inference
//!
//! Annotations win, then default-value literals, then the first usage that
//! pins a type (comparison against a literal, `len(p)`, truth tests). Anything
//! left over is `int`.

use super::tree::{CmpOp, Expr, FunctionDef, Stmt};
use crate::shared::SymbolicType;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub ty: SymbolicType,
    /// True when the type did not come from an annotation
    pub inferred: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl FunctionSignature {
    pub fn infer(func: &FunctionDef) -> Self {
        let mut usage: FxHashMap<String, SymbolicType> = FxHashMap::default();
        let names: Vec<&str> = func.params.iter().map(|p| p.name.as_str()).collect();
        for stmt in &func.body {
            scan_stmt(stmt, &names, &mut usage);
        }

        let params = func
            .params
            .iter()
            .map(|p| {
                if let Some(ty) = p.annotation {
                    return ParamSpec {
                        name: p.name.clone(),
                        ty,
                        inferred: false,
                    };
                }
                let ty = p
                    .default
                    .as_ref()
                    .and_then(Expr::literal_type)
                    .or_else(|| usage.get(&p.name).copied())
                    .unwrap_or(SymbolicType::Int);
                ParamSpec {
                    name: p.name.clone(),
                    ty,
                    inferred: true,
                }
            })
            .collect();

        Self {
            name: func.name.clone(),
            params,
        }
    }

    pub fn type_of(&self, name: &str) -> Option<SymbolicType> {
        self.params.iter().find(|p| p.name == name).map(|p| p.ty)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

fn note(usage: &mut FxHashMap<String, SymbolicType>, name: &str, ty: SymbolicType) {
    usage.entry(name.to_string()).or_insert(ty);
}

fn param_name<'a>(e: &'a Expr, params: &[&str]) -> Option<&'a str> {
    match e {
        Expr::Name(n) if params.contains(&n.as_str()) => Some(n.as_str()),
        _ => None,
    }
}

fn element_type(container: &Expr) -> Option<SymbolicType> {
    match container {
        Expr::List(items) => items.first().and_then(Expr::literal_type),
        Expr::Dict(entries) => entries.first().and_then(|(k, _)| k.literal_type()),
        Expr::Str(_) => Some(SymbolicType::String),
        _ => None,
    }
}

fn scan_test(e: &Expr, params: &[&str], usage: &mut FxHashMap<String, SymbolicType>) {
    match e {
        Expr::Name(n) if params.contains(&n.as_str()) => note(usage, n, SymbolicType::Bool),
        Expr::Not(inner) => scan_test(inner, params, usage),
        Expr::Logical { left, right, .. } => {
            scan_test(left, params, usage);
            scan_test(right, params, usage);
        }
        other => scan_expr(other, params, usage),
    }
}

fn scan_expr(e: &Expr, params: &[&str], usage: &mut FxHashMap<String, SymbolicType>) {
    match e {
        Expr::Compare { op, left, right } => {
            if matches!(op, CmpOp::In | CmpOp::NotIn) {
                if let Some(p) = param_name(left, params) {
                    if let Some(ty) = element_type(right) {
                        note(usage, p, ty);
                    }
                }
                if let Some(p) = param_name(right, params) {
                    let ty = match left.as_ref() {
                        Expr::Str(_) => SymbolicType::String,
                        _ => SymbolicType::List,
                    };
                    note(usage, p, ty);
                }
            } else {
                if let (Some(p), Some(ty)) = (param_name(left, params), right.literal_type()) {
                    note(usage, p, ty);
                }
                if let (Some(p), Some(ty)) = (param_name(right, params), left.literal_type()) {
                    note(usage, p, ty);
                }
                if let (Some(p), Expr::Len(_)) = (param_name(left, params), right.as_ref()) {
                    note(usage, p, SymbolicType::Int);
                }
            }
            scan_expr(left, params, usage);
            scan_expr(right, params, usage);
        }
        Expr::Len(inner) => {
            if let Some(p) = param_name(inner, params) {
                note(usage, p, SymbolicType::List);
            }
        }
        Expr::Arith { left, right, .. } => {
            if let (Some(p), Expr::Float(_)) = (param_name(left, params), right.as_ref()) {
                note(usage, p, SymbolicType::Float);
            }
            if let (Some(p), Expr::Float(_)) = (param_name(right, params), left.as_ref()) {
                note(usage, p, SymbolicType::Float);
            }
            scan_expr(left, params, usage);
            scan_expr(right, params, usage);
        }
        Expr::Logical { .. } | Expr::Not(_) => scan_test(e, params, usage),
        Expr::Neg(inner) => scan_expr(inner, params, usage),
        Expr::Call { args, .. } => args.iter().for_each(|a| scan_expr(a, params, usage)),
        Expr::List(items) => items.iter().for_each(|a| scan_expr(a, params, usage)),
        Expr::Dict(entries) => entries.iter().for_each(|(k, v)| {
            scan_expr(k, params, usage);
            scan_expr(v, params, usage);
        }),
        Expr::Int(_)
        | Expr::Float(_)
        | Expr::Bool(_)
        | Expr::Str(_)
        | Expr::None
        | Expr::Name(_)
        | Expr::Opaque(_) => {}
    }
}

fn scan_block(body: &[Stmt], params: &[&str], usage: &mut FxHashMap<String, SymbolicType>) {
    body.iter().for_each(|s| scan_stmt(s, params, usage));
}

fn scan_stmt(stmt: &Stmt, params: &[&str], usage: &mut FxHashMap<String, SymbolicType>) {
    match stmt {
        Stmt::If {
            test, body, orelse, ..
        }
        | Stmt::While {
            test, body, orelse, ..
        } => {
            scan_test(test, params, usage);
            scan_block(body, params, usage);
            scan_block(orelse, params, usage);
        }
        Stmt::For {
            iter, body, orelse, ..
        } => {
            if let Some(p) = param_name(iter, params) {
                note(usage, p, SymbolicType::List);
            }
            scan_expr(iter, params, usage);
            scan_block(body, params, usage);
            scan_block(orelse, params, usage);
        }
        Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
            ..
        } => {
            scan_block(body, params, usage);
            for h in handlers {
                scan_block(&h.body, params, usage);
            }
            scan_block(orelse, params, usage);
            scan_block(finalbody, params, usage);
        }
        Stmt::Assert { test, .. } => scan_test(test, params, usage),
        Stmt::Assign { value, .. } | Stmt::Expr { value, .. } => scan_expr(value, params, usage),
        Stmt::Return { value, .. } => {
            if let Some(v) = value {
                scan_expr(v, params, usage);
            }
        }
        Stmt::Raise { .. } | Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Pass => {}
    }
}
