//! Branch points

use crate::features::parsing::domain::Expr;
use crate::shared::Span;
use serde::{Deserialize, Serialize};

pub type BranchId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchKind {
    /// `if` / `elif`
    Conditional,
    /// `while` guard or a `for` loop's "has next item" guard
    LoopGuard,
    /// One `except` clause: true edge = the handler runs
    ExceptionHandler { exception: Option<String> },
    /// `assert` under formal verification
    Assertion,
}

/// A control-flow divergence point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchPoint {
    pub id: BranchId,
    pub span: Span,
    /// Governing expression, as written in the source
    pub expr: Expr,
    pub kind: BranchKind,
    /// Instruction indices of the true and false successors
    pub successors: [usize; 2],
}

impl BranchPoint {
    pub fn is_loop_guard(&self) -> bool {
        matches!(self.kind, BranchKind::LoopGuard)
    }
}
