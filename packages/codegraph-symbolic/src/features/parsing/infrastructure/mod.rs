//! Front-end implementations

mod python;

pub use python::PythonFrontend;

use crate::errors::{Result, SymbolicError};
use crate::features::parsing::domain::Language;
use crate::features::parsing::ports::LanguageFrontend;

/// Front end for `language`, or `UnsupportedLanguage`
pub fn frontend_for(language: Language) -> Result<Box<dyn LanguageFrontend>> {
    match language {
        Language::Python => Ok(Box::new(PythonFrontend::new())),
        other => Err(SymbolicError::UnsupportedLanguage(other.to_string())),
    }
}
