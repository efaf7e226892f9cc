//! `enum` keyword validator

use crate::error::{ValidationError, ValidationResult};
use crate::traits::ValidationRule;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct EnumValidator {
    pub allowed: Vec<Value>,
}

impl EnumValidator {
    pub fn new(allowed: Vec<Value>) -> Self {
        Self { allowed }
    }
}

impl ValidationRule for EnumValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        if self.allowed.iter().any(|candidate| candidate == value) {
            return Ok(());
        }
        Err(ValidationError::new(
            "enum",
            instance_path,
            "must be equal to one of the allowed values",
        )
        .with_params(json!({ "allowedValues": self.allowed }))
        .into())
    }

    fn rule_name(&self) -> &'static str {
        "enum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let rule = EnumValidator::new(vec![json!("open"), json!("closed")]);
        assert!(rule.validate(&json!("open"), "").is_ok());
        let errors = rule.validate(&json!("pending"), "/status").unwrap_err();
        assert_eq!(errors.first().unwrap().instance_path, "/status");
    }
}
