//! Requested native types and coercion results

use crate::shared::{NativeValue, SymbolicType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Native type a solver value should become
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedType {
    /// No declared type: integer-like values stay integers
    Untyped,
    Int,
    Float,
    Bool,
    Str,
    List,
    Dict,
}

impl RequestedType {
    /// Zero/empty fallback
    pub fn default_value(&self) -> NativeValue {
        match self {
            RequestedType::Untyped | RequestedType::Int => NativeValue::Int(0),
            RequestedType::Float => NativeValue::Float(0.0),
            RequestedType::Bool => NativeValue::Bool(false),
            RequestedType::Str => NativeValue::Str(String::new()),
            RequestedType::List => NativeValue::List(Vec::new()),
            RequestedType::Dict => NativeValue::Dict(Vec::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestedType::Untyped => "untyped",
            RequestedType::Int => "int",
            RequestedType::Float => "float",
            RequestedType::Bool => "bool",
            RequestedType::Str => "str",
            RequestedType::List => "list",
            RequestedType::Dict => "dict",
        }
    }
}

impl From<SymbolicType> for RequestedType {
    fn from(ty: SymbolicType) -> Self {
        match ty {
            SymbolicType::Int => RequestedType::Int,
            SymbolicType::Float => RequestedType::Float,
            SymbolicType::Bool => RequestedType::Bool,
            SymbolicType::String => RequestedType::Str,
            SymbolicType::List => RequestedType::List,
            SymbolicType::Dict => RequestedType::Dict,
        }
    }
}

impl fmt::Display for RequestedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A solver value that did not convert cleanly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCoercionWarning {
    /// Rendering of the original solver value
    pub value: String,
    pub requested: RequestedType,
    /// Python literal that was used instead
    pub fallback: String,
}

impl fmt::Display for ValueCoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not convert {} to {}; using {}",
            self.value, self.requested, self.fallback
        )
    }
}

/// Result of a coercion: always a value, sometimes a warning
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    pub value: NativeValue,
    pub warning: Option<ValueCoercionWarning>,
}

impl Coerced {
    pub fn clean(value: NativeValue) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn fallback(original: impl fmt::Display, requested: RequestedType) -> Self {
        let value = requested.default_value();
        let warning = ValueCoercionWarning {
            value: original.to_string(),
            requested,
            fallback: value.to_string(),
        };
        Self {
            value,
            warning: Some(warning),
        }
    }
}
