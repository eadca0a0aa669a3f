//! Symbolic type tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag attached to every path condition.
///
/// Which tags a caller may solve over is decided by the capability snapshot
/// (`constraint_types`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolicType {
    Int,
    Bool,
    #[serde(alias = "str")]
    String,
    Float,
    List,
    Dict,
}

impl SymbolicType {
    pub const ALL: [SymbolicType; 6] = [
        SymbolicType::Int,
        SymbolicType::Bool,
        SymbolicType::String,
        SymbolicType::Float,
        SymbolicType::List,
        SymbolicType::Dict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Float => "float",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }

    /// Parse a tag or a source-level annotation name.
    ///
    /// Generic annotations (`list[int]`, `Dict[str, int]`) map to their
    /// container tag.
    pub fn from_annotation(text: &str) -> Option<Self> {
        let head = text
            .split(|c: char| c == '[' || c == '<')
            .next()
            .unwrap_or("")
            .trim()
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match head.as_str() {
            "int" | "integer" => Some(Self::Int),
            "bool" | "boolean" => Some(Self::Bool),
            "str" | "string" => Some(Self::String),
            "float" | "double" => Some(Self::Float),
            "list" | "sequence" | "tuple" => Some(Self::List),
            "dict" | "mapping" => Some(Self::Dict),
            _ => None,
        }
    }

    /// Container tags are modeled through their length and membership atoms
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List | Self::Dict)
    }
}

impl fmt::Display for SymbolicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
