//! Required property validator

use crate::error::{ValidationError, ValidationErrors, ValidationResult};
use crate::traits::ValidationRule;
use serde_json::{json, Value};

/// Validator that ensures an object carries every listed property
#[derive(Debug, Clone, Default)]
pub struct RequiredValidator {
    pub properties: Vec<String>,
}

impl RequiredValidator {
    pub fn new(properties: Vec<String>) -> Self {
        Self { properties }
    }

    /// Build from the `required` keyword value
    pub fn from_schema(required: &Value) -> Option<Self> {
        let list = required.as_array()?;
        let properties = list
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect::<Vec<_>>();
        if properties.is_empty() {
            None
        } else {
            Some(Self::new(properties))
        }
    }
}

impl ValidationRule for RequiredValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        let Some(object) = value.as_object() else {
            return Ok(());
        };

        let mut errors = ValidationErrors::new();
        for property in &self.properties {
            if !object.contains_key(property) {
                errors.add(
                    ValidationError::new(
                        "required",
                        instance_path,
                        format!("must have required property '{}'", property),
                    )
                    .with_params(json!({ "missingProperty": property })),
                );
            }
        }
        errors.into_result()
    }

    fn rule_name(&self) -> &'static str {
        "required"
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({ "properties": self.properties }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_each_missing_property() {
        let rule = RequiredValidator::new(vec!["name".into(), "email".into()]);
        let errors = rule.validate(&json!({ "name": "x" }), "").unwrap_err();

        assert_eq!(errors.len(), 1);
        let error = errors.first().unwrap();
        assert_eq!(error.keyword, "required");
        assert!(error.message.contains("email"));
    }

    #[test]
    fn test_null_counts_as_present() {
        let rule = RequiredValidator::new(vec!["name".into()]);
        assert!(rule.validate(&json!({ "name": null }), "").is_ok());
    }

    #[test]
    fn test_empty_required_list_builds_nothing() {
        assert!(RequiredValidator::from_schema(&json!([])).is_none());
    }
}
