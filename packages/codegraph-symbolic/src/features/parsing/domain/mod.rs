//! Normalized tree domain

mod language;
pub mod semantics;
mod signature;
mod tree;

pub use language::Language;
pub use signature::{FunctionSignature, ParamSpec};
pub use tree::{
    ArithOp, CmpOp, ExceptHandler, Expr, FunctionDef, LogicalOp, Param, SourceModule, Stmt,
};
