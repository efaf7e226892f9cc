//! `type` keyword validator with optional scalar coercion

use std::borrow::Cow;

use crate::error::{ValidationError, ValidationResult};
use crate::traits::{json_type_name, ValidationRule};
use serde_json::{json, Number, Value};

/// Validator for the `type` keyword
#[derive(Debug, Clone)]
pub struct TypeValidator {
    pub expected: Vec<String>,
    /// Accept scalars that can be converted to the expected type
    pub coerce: bool,
}

impl TypeValidator {
    pub fn new(expected: Vec<String>) -> Self {
        Self { expected, coerce: false }
    }

    /// Build from the `type` keyword value (a name or a list of names)
    pub fn from_schema(type_spec: &Value) -> Option<Self> {
        let expected = match type_spec {
            Value::String(name) => vec![name.clone()],
            Value::Array(names) => names
                .iter()
                .filter_map(|n| n.as_str().map(str::to_string))
                .collect(),
            _ => return None,
        };
        Some(Self::new(expected))
    }

    pub fn coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
    }

    /// Returns the value as the remaining keywords should see it
    pub fn resolve<'a>(&self, value: &'a Value, instance_path: &str) -> ValidationResult<Cow<'a, Value>> {
        if self.expected.iter().any(|t| matches_type(t, value)) {
            return Ok(Cow::Borrowed(value));
        }

        if self.coerce {
            if let Some(coerced) = self.expected.iter().find_map(|t| coerce_to(t, value)) {
                return Ok(Cow::Owned(coerced));
            }
        }

        Err(ValidationError::new(
            "type",
            instance_path,
            format!("must be {}", self.expected.join(",")),
        )
        .with_params(json!({ "type": self.expected, "actual": json_type_name(value) }))
        .into())
    }
}

impl ValidationRule for TypeValidator {
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()> {
        self.resolve(value, instance_path).map(|_| ())
    }

    fn rule_name(&self) -> &'static str {
        "type"
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({ "type": self.expected, "coerce": self.coerce }))
    }
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "number" => value.is_number(),
        "integer" => match value {
            Value::Number(n) => n.is_i64() || n.is_u64() || n.as_f64().map_or(false, |f| f.fract() == 0.0),
            _ => false,
        },
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => false,
    }
}

/// Scalar conversions accepted when coercion is enabled
pub fn coerce_to(expected: &str, value: &Value) -> Option<Value> {
    match (expected, value) {
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        ("string", Value::Null) => Some(Value::String(String::new())),
        ("number", Value::String(s)) => parse_number(s),
        ("integer", Value::String(s)) => parse_number(s).filter(|n| matches_type("integer", n)),
        ("number" | "integer", Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        ("number" | "integer", Value::Null) => Some(Value::from(0)),
        ("boolean", Value::String(s)) if s == "true" => Some(Value::Bool(true)),
        ("boolean", Value::String(s)) if s == "false" => Some(Value::Bool(false)),
        ("boolean", Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Null) => Some(Value::Bool(false)),
        ("null", Value::String(s)) if s.is_empty() => Some(Value::Null),
        ("null", Value::Bool(false)) => Some(Value::Null),
        ("null", Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Null),
        _ => None,
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Value::from(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_mismatched_type() {
        let rule = TypeValidator::new(vec!["number".into()]);
        let errors = rule.validate(&json!("NOT A NUMBER"), "/id").unwrap_err();
        let error = errors.first().unwrap();
        assert_eq!(error.keyword, "type");
        assert_eq!(error.instance_path, "/id");
    }

    #[test]
    fn test_coerces_numeric_strings() {
        let rule = TypeValidator::new(vec!["number".into()]).coerce(true);
        let input = json!("42");
        let resolved = rule.resolve(&input, "/n").unwrap();
        assert_eq!(resolved.into_owned(), json!(42));
        assert!(rule.validate(&json!("forty two"), "/n").is_err());
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        let rule = TypeValidator::new(vec!["integer".into()]);
        assert!(rule.validate(&json!(3.0), "").is_ok());
        assert!(rule.validate(&json!(3.5), "").is_err());
    }

    #[test]
    fn test_string_coercion_from_number() {
        assert_eq!(coerce_to("string", &json!(1)), Some(json!("1")));
        assert_eq!(coerce_to("boolean", &json!(1)), Some(json!(true)));
        assert_eq!(coerce_to("boolean", &json!(2)), None);
    }
}
