//! Pattern-based validator using regular expressions

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use regex::Regex;
use serde_json::{json, Value};

/// Validator for the `pattern` keyword (unanchored search, as in JSON Schema)
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pattern: Regex,
    source: String,
}

impl PatternValidator {
    /// Create a new pattern validator.
    ///
    /// Accepts a literal form such as `/^ab+$/i`, translating trailing flags
    /// into inline flags.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let translated = translate_literal(pattern);
        let regex = Regex::new(&translated)?;
        Ok(Self {
            pattern: regex,
            source: pattern.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn translate_literal(pattern: &str) -> String {
    if pattern.len() >= 2 && pattern.starts_with('/') {
        if let Some(end) = pattern.rfind('/') {
            if end > 0 {
                let body = &pattern[1..end];
                let flags: String = pattern[end + 1..]
                    .chars()
                    .filter(|c| matches!(c, 'i' | 'm' | 's'))
                    .collect();
                if flags.is_empty() {
                    return body.to_string();
                }
                return format!("(?{}){}", flags, body);
            }
        }
    }
    pattern.to_string()
}

impl ValidationRule for PatternValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };

        if self.pattern.is_match(text) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "pattern",
                instance_path,
                format!("must match pattern \"{}\"", self.source),
            )
            .with_params(json!({ "pattern": self.source }))
            .into())
        }
    }

    fn rule_name(&self) -> &'static str {
        "pattern"
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({ "pattern": self.source }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unanchored_match() {
        let rule = PatternValidator::new("test").unwrap();
        assert!(rule.validate(&json!("a test string"), "").is_ok());
        assert!(rule.validate(&json!("nothing"), "").is_err());
    }

    #[test]
    fn test_literal_form_with_flags() {
        let rule = PatternValidator::new("/^abc$/i").unwrap();
        assert!(rule.validate(&json!("ABC"), "").is_ok());
        assert_eq!(rule.source(), "/^abc$/i");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PatternValidator::new("(unclosed").is_err());
    }
}
