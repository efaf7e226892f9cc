//! Numeric range validators

use crate::error::{ValidationError, ValidationErrors, ValidationResult};
use crate::traits::ValidationRule;
use serde_json::{json, Value};

/// Validator for `minimum`, `maximum`, their exclusive variants and `multipleOf`
#[derive(Debug, Clone, Default)]
pub struct NumericValidator {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,
    pub multiple_of: Option<f64>,
}

impl NumericValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn multiple_of(mut self, multiple_of: f64) -> Self {
        self.multiple_of = Some(multiple_of);
        self
    }

    /// Build from a schema fragment, `None` when no numeric keyword is present
    pub fn from_schema(schema: &serde_json::Map<String, Value>) -> Option<Self> {
        let rule = Self {
            minimum: schema.get("minimum").and_then(Value::as_f64),
            maximum: schema.get("maximum").and_then(Value::as_f64),
            exclusive_minimum: schema.get("exclusiveMinimum").and_then(Value::as_f64),
            exclusive_maximum: schema.get("exclusiveMaximum").and_then(Value::as_f64),
            multiple_of: schema
                .get("multipleOf")
                .and_then(Value::as_f64)
                .filter(|m| *m > 0.0),
        };

        let any = rule.minimum.is_some()
            || rule.maximum.is_some()
            || rule.exclusive_minimum.is_some()
            || rule.exclusive_maximum.is_some()
            || rule.multiple_of.is_some();
        any.then_some(rule)
    }
}

impl ValidationRule for NumericValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        let Some(number) = value.as_f64() else {
            return Ok(());
        };

        let mut errors = ValidationErrors::new();
        let mut check = |failed: bool, keyword: &str, comparison: &str, limit: f64| {
            if failed {
                errors.add(
                    ValidationError::new(keyword, instance_path, format!("must be {} {}", comparison, limit))
                        .with_params(json!({ "comparison": comparison, "limit": limit })),
                );
            }
        };

        if let Some(min) = self.minimum {
            check(number < min, "minimum", ">=", min);
        }
        if let Some(max) = self.maximum {
            check(number > max, "maximum", "<=", max);
        }
        if let Some(min) = self.exclusive_minimum {
            check(number <= min, "exclusiveMinimum", ">", min);
        }
        if let Some(max) = self.exclusive_maximum {
            check(number >= max, "exclusiveMaximum", "<", max);
        }

        if let Some(step) = self.multiple_of {
            let quotient = number / step;
            if (quotient - quotient.round()).abs() > f64::EPSILON * quotient.abs().max(1.0) {
                errors.add(
                    ValidationError::new("multipleOf", instance_path, format!("must be multiple of {}", step))
                        .with_params(json!({ "multipleOf": step })),
                );
            }
        }

        errors.into_result()
    }

    fn rule_name(&self) -> &'static str {
        "numeric"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inclusive_bounds() {
        let rule = NumericValidator::new().minimum(1.0).maximum(10.0);
        assert!(rule.validate(&json!(1), "").is_ok());
        assert!(rule.validate(&json!(10), "").is_ok());
        assert_eq!(rule.validate(&json!(0), "").unwrap_err().first().unwrap().keyword, "minimum");
        assert_eq!(rule.validate(&json!(11), "").unwrap_err().first().unwrap().keyword, "maximum");
    }

    #[test]
    fn test_exclusive_bounds_from_schema() {
        let schema = json!({ "exclusiveMinimum": 0, "exclusiveMaximum": 5 });
        let rule = NumericValidator::from_schema(schema.as_object().unwrap()).unwrap();
        assert!(rule.validate(&json!(0), "").is_err());
        assert!(rule.validate(&json!(5), "").is_err());
        assert!(rule.validate(&json!(2.5), "").is_ok());
    }

    #[test]
    fn test_multiple_of() {
        let rule = NumericValidator::new().multiple_of(0.5);
        assert!(rule.validate(&json!(2.5), "").is_ok());
        assert!(rule.validate(&json!(2.25), "").is_err());
    }

    #[test]
    fn test_zero_multiple_is_ignored() {
        let schema = json!({ "multipleOf": 0 });
        assert!(NumericValidator::from_schema(schema.as_object().unwrap()).is_none());
    }
}
