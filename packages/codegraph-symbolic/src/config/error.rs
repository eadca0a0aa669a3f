//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Unknown capability key in YAML
    #[error("Unknown field '{field}' in section '{section}'. {suggestion}")]
    UnknownField {
        field: String,
        section: String,
        suggestion: String,
        valid_fields: Vec<String>,
    },

    /// Missing version field in YAML
    #[error("Missing 'version' field in capability file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    /// Unsupported version
    #[error("Unsupported capability file version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    /// Unknown tier name
    #[error("Unknown tier '{0}'. Valid tiers: community, pro, enterprise")]
    UnknownTier(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an unknown field error with a "did you mean" suggestion
    pub fn unknown_field_with_suggestion(
        field: impl Into<String>,
        section: impl Into<String>,
        valid_fields: Vec<String>,
    ) -> Self {
        let field = field.into();
        let suggestion = find_closest_match(&field, &valid_fields);

        Self::UnknownField {
            field,
            section: section.into(),
            suggestion,
            valid_fields,
        }
    }
}

fn find_closest_match(target: &str, candidates: &[String]) -> String {
    match candidates
        .iter()
        .min_by_key(|candidate| levenshtein_distance(target, candidate))
    {
        Some(closest) => format!("Did you mean '{}'?", closest),
        None => "No valid fields available".to_string(),
    }
}

/// Two-row Levenshtein distance over chars
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let b: Vec<char> = s2.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, c1) in s1.chars().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in b.iter().enumerate() {
            let cost = usize::from(c1 != *c2);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("max_depth", "max_depth"), 0);
        assert_eq!(levenshtein_distance("max_depth", "max_paths"), 4);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn test_closest_match() {
        let valid_fields = vec![
            "max_depth".to_string(),
            "max_paths".to_string(),
            "max_loop_iterations".to_string(),
        ];

        let suggestion = find_closest_match("max_depht", &valid_fields);
        assert!(suggestion.contains("max_depth"));

        let empty: Vec<String> = vec![];
        assert!(find_closest_match("max_depth", &empty).contains("No valid fields"));
    }

    #[test]
    fn test_error_formatting() {
        let err = ConfigError::range_with_hint(
            "max_loop_iterations",
            0,
            1,
            1024,
            "Loops must be unrolled at least once",
        );

        let msg = err.to_string();
        assert!(msg.contains("max_loop_iterations"));
        assert!(msg.contains("1..=1024"));
        assert!(msg.contains("unrolled at least once"));
    }

    #[test]
    fn test_unknown_field_error() {
        let valid = vec!["max_depth".to_string(), "max_paths".to_string()];
        let err = ConfigError::unknown_field_with_suggestion("max_pahts", "capabilities", valid);

        let msg = err.to_string();
        assert!(msg.contains("max_pahts"));
        assert!(msg.contains("capabilities"));
        assert!(msg.contains("Did you mean 'max_paths'"));
    }

    #[test]
    fn test_version_errors() {
        let err = ConfigError::UnsupportedVersion {
            found: 2,
            supported: vec![1],
        };
        let msg = err.to_string();
        assert!(msg.contains("version 2"));
        assert!(msg.contains("Supported versions: 1"));

        assert!(ConfigError::MissingVersion.to_string().contains("version: 1"));
    }

    #[test]
    fn test_unknown_tier_error() {
        let msg = ConfigError::UnknownTier("platinum".to_string()).to_string();
        assert!(msg.contains("platinum"));
        assert!(msg.contains("community, pro, enterprise"));
    }
}
