//! Shared models
//!
//! - `Span`: source locations carried by branch points
//! - `SymbolicType`: the type tags used to gate constraint kinds
//! - `NativeValue`: source-language values produced by synthesis and replay

mod span;
mod symbolic_type;
mod value;

pub use span::Span;
pub use symbolic_type::SymbolicType;
pub use value::NativeValue;
