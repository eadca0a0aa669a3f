//! Shared models and utilities used across features

pub mod deadline;
pub mod models;

pub use deadline::{CancellationToken, Deadline};
pub use models::{NativeValue, Span, SymbolicType};
