//! Core validation traits

use crate::error::ValidationResult;
use serde_json::Value;

/// A single schema keyword check applied to one value
pub trait ValidationRule: Send + Sync {
    /// Validate `value`, located at `instance_path` inside the candidate
    fn validate(&self, value: &Value, instance_path: &str) -> ValidationResult<()>;

    /// Get the schema keyword this rule enforces
    fn rule_name(&self) -> &'static str;

    /// Get validation rule parameters/configuration as JSON
    fn parameters(&self) -> Option<Value> {
        None
    }
}

/// Pass/fail validation of a candidate object against a JSON-Schema descriptor
pub trait Validator: Send + Sync {
    fn validate(&self, schema: &Value, instance: &Value) -> ValidationResult<()>;
}

/// JSON type name of a value as used by the `type` keyword
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Append a property name to a JSON pointer
pub fn child_path(parent: &str, segment: &str) -> String {
    let escaped = segment.replace('~', "~0").replace('/', "~1");
    format!("{}/{}", parent, escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_type_names() {
        assert_eq!(json_type_name(&json!(1)), "integer");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!("a")), "string");
        assert_eq!(json_type_name(&json!(null)), "null");
    }

    #[test]
    fn test_child_path_escapes_pointer_tokens() {
        assert_eq!(child_path("", "name"), "/name");
        assert_eq!(child_path("/a", "b/c"), "/a/b~1c");
    }
}
