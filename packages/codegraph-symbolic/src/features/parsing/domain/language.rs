//! Source languages known to the toolkit

use crate::errors::SymbolicError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language tag. Every language of the wider toolkit is recognized by name;
/// only those with a front end can be explored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Java,
    Go,
    Kotlin,
    Rust,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Go => "go",
            Self::Kotlin => "kotlin",
            Self::Rust => "rust",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" => Some(Self::Python),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "tsx" => Some(Self::TypeScript),
            "java" => Some(Self::Java),
            "go" => Some(Self::Go),
            "kt" | "kts" => Some(Self::Kotlin),
            "rs" => Some(Self::Rust),
            _ => None,
        }
    }
}

impl FromStr for Language {
    type Err = SymbolicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Self::Python),
            "javascript" | "js" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "java" => Ok(Self::Java),
            "go" | "golang" => Ok(Self::Go),
            "kotlin" | "kt" => Ok(Self::Kotlin),
            "rust" | "rs" => Ok(Self::Rust),
            _ => Err(SymbolicError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_aliases() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("ts".parse::<Language>().unwrap(), Language::TypeScript);
        assert!(matches!(
            "cobol".parse::<Language>(),
            Err(SymbolicError::UnsupportedLanguage(_))
        ));
        assert_eq!(Language::from_extension("pyi"), Some(Language::Python));
    }
}
