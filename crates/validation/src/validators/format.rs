//! `format` keyword validator

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$")
        .expect("email regex is valid")
});

/// Validator for string formats. Unknown formats always pass.
#[derive(Debug, Clone)]
pub struct FormatValidator {
    pub format: String,
}

impl FormatValidator {
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }

    fn matches(&self, text: &str) -> bool {
        match self.format.as_str() {
            "date-time" => chrono::DateTime::parse_from_rfc3339(text).is_ok(),
            "date" => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
            "time" => chrono::NaiveTime::parse_from_str(text, "%H:%M:%S%.f").is_ok(),
            "email" => EMAIL_REGEX.is_match(text),
            "uuid" => uuid::Uuid::parse_str(text).is_ok(),
            _ => true,
        }
    }
}

impl ValidationRule for FormatValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        let Some(text) = value.as_str() else {
            return Ok(());
        };

        if self.matches(text) {
            Ok(())
        } else {
            Err(ValidationError::new(
                "format",
                instance_path,
                format!("must match format \"{}\"", self.format),
            )
            .with_params(json!({ "format": self.format }))
            .into())
        }
    }

    fn rule_name(&self) -> &'static str {
        "format"
    }
}
