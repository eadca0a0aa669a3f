//! Error types for codegraph-symbolic
//!
//! Structural problems (bad tree, unsupported language, missing entry point)
//! surface as `SymbolicError`. Resource and timing problems (solver timeout,
//! backend crash, budget exhaustion) never reach this type: they are absorbed
//! into degraded results by the explorer.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for symbolic execution operations
#[derive(Debug, Error)]
pub enum SymbolicError {
    /// Malformed or unsupported tree shape. Fatal for the call, never retried.
    #[error("Parse structure error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseStructure { message: String, line: Option<u32> },

    /// Source language has no front end
    #[error("Unsupported language '{0}'")]
    UnsupportedLanguage(String),

    /// Requested function does not exist in the module
    #[error("Entry point '{0}' not found")]
    EntryPointNotFound(String),

    /// Operation requires a capability the caller's tier does not enable
    #[error("Feature '{0}' is not enabled for this caller")]
    FeatureDisabled(&'static str),

    /// Invalid input value (e.g. a negative decay factor)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SymbolicError {
    /// Create a parse structure error without location
    pub fn parse_structure(msg: impl Into<String>) -> Self {
        SymbolicError::ParseStructure {
            message: msg.into(),
            line: None,
        }
    }

    /// Create a parse structure error at a 1-based line
    pub fn parse_structure_at(msg: impl Into<String>, line: u32) -> Self {
        SymbolicError::ParseStructure {
            message: msg.into(),
            line: Some(line),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        SymbolicError::Validation(msg.into())
    }

    /// Structural errors are reported to the caller as failures
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SymbolicError::ParseStructure { .. }
                | SymbolicError::UnsupportedLanguage(_)
                | SymbolicError::EntryPointNotFound(_)
        )
    }
}

/// Result type alias for symbolic execution operations
pub type Result<T> = std::result::Result<T, SymbolicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structure_message_includes_line() {
        let err = SymbolicError::parse_structure_at("unrecognized node 'match_statement'", 4);
        assert_eq!(
            err.to_string(),
            "Parse structure error at line 4: unrecognized node 'match_statement'"
        );
        assert!(err.is_structural());
    }

    #[test]
    fn test_validation_is_not_structural() {
        let err = SymbolicError::validation("decay factor must be non-negative");
        assert!(!err.is_structural());
        assert!(err.to_string().contains("non-negative"));
    }
}
