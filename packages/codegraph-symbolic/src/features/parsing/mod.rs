//! Parsing feature
//!
//! Source text → normalized `SourceModule`. Only Python has a front end; other
//! toolkit languages are recognized and rejected with `UnsupportedLanguage`.

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::{FunctionDef, FunctionSignature, Language, SourceModule};
pub use infrastructure::{frontend_for, PythonFrontend};
pub use ports::LanguageFrontend;

use crate::errors::Result;

/// Parse `source` written in `language` (a name such as `"python"`)
pub fn parse_source(source: &str, language: &str) -> Result<SourceModule> {
    let language: Language = language.parse()?;
    frontend_for(language)?.lower_module(source)
}
