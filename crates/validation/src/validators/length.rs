//! `minLength` / `maxLength` validator for strings

use crate::error::{ValidationError, ValidationErrors, ValidationResult};
use crate::traits::ValidationRule;
use serde_json::{json, Value};

/// Validator for string length constraints
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    /// Minimum length (inclusive)
    pub min: Option<usize>,
    /// Maximum length (inclusive)
    pub max: Option<usize>,
}

impl LengthValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Build from a schema fragment, `None` when neither keyword is present
    pub fn from_schema(schema: &serde_json::Map<String, Value>) -> Option<Self> {
        let min = schema.get("minLength").and_then(Value::as_u64).map(|n| n as usize);
        let max = schema.get("maxLength").and_then(Value::as_u64).map(|n| n as usize);
        if min.is_none() && max.is_none() {
            return None;
        }
        Some(Self { min, max })
    }
}

impl ValidationRule for LengthValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        // Only strings carry a length
        let Some(text) = value.as_str() else {
            return Ok(());
        };
        let length = text.chars().count();

        let mut errors = ValidationErrors::new();
        if let Some(min) = self.min {
            if length < min {
                errors.add(
                    ValidationError::new(
                        "minLength",
                        instance_path,
                        format!("must NOT have fewer than {} characters", min),
                    )
                    .with_params(json!({ "limit": min })),
                );
            }
        }
        if let Some(max) = self.max {
            if length > max {
                errors.add(
                    ValidationError::new(
                        "maxLength",
                        instance_path,
                        format!("must NOT have more than {} characters", max),
                    )
                    .with_params(json!({ "limit": max })),
                );
            }
        }
        errors.into_result()
    }

    fn rule_name(&self) -> &'static str {
        "length"
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({ "minLength": self.min, "maxLength": self.max }))
    }
}
