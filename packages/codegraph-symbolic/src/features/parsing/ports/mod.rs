//! Front-end port
//!
//! Defines the contract for lowering source text into the normalized tree.

use crate::errors::Result;
use crate::features::parsing::domain::{Language, SourceModule};

/// Language front end - abstraction over parser + lowering
pub trait LanguageFrontend: Send + Sync {
    fn language(&self) -> Language;

    /// Check if this front end handles the given file extension
    fn supports_extension(&self, ext: &str) -> bool;

    /// Parse and lower every top-level function
    fn lower_module(&self, source: &str) -> Result<SourceModule>;
}
