//! JSON-Schema walker that applies the keyword validators

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationErrors, ValidationResult};
use crate::traits::{child_path, ValidationRule, Validator};
use crate::validators::{
    EnumValidator, FormatValidator, LengthValidator, NumericValidator, PatternValidator,
    RequiredValidator, TypeValidator,
};

/// Validator over the JSON-Schema subset produced by model schemas.
///
/// Every failure is collected (evaluation does not stop at the first one),
/// except that a value failing `type` skips its remaining keywords.
#[derive(Debug, Clone)]
pub struct JsonSchemaValidator {
    coerce_types: bool,
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchemaValidator {
    /// Validator that accepts coercible scalars
    pub fn new() -> Self {
        Self { coerce_types: true }
    }

    /// Validator that requires exact JSON types
    pub fn strict() -> Self {
        Self { coerce_types: false }
    }

    pub fn coerce_types(&self) -> bool {
        self.coerce_types
    }

    fn validate_node(&self, schema: &Value, value: &Value, path: &str, errors: &mut ValidationErrors) {
        let Some(schema) = schema.as_object() else {
            return;
        };

        let value: Cow<'_, Value> = match schema.get("type").and_then(TypeValidator::from_schema) {
            Some(rule) => match rule.coerce(self.coerce_types).resolve(value, path) {
                Ok(resolved) => resolved,
                Err(type_errors) => {
                    errors.merge(type_errors);
                    return;
                }
            },
            None => Cow::Borrowed(value),
        };

        for rule in self.keyword_rules(schema, path, errors) {
            if let Err(rule_errors) = rule.validate(&value, path) {
                errors.merge(rule_errors);
            }
        }

        match value.as_ref() {
            Value::Object(object) => self.validate_object(schema, object, &value, path, errors),
            Value::Array(items) => {
                if let Some(item_schema) = schema.get("items") {
                    for (index, item) in items.iter().enumerate() {
                        self.validate_node(item_schema, item, &child_path(path, &index.to_string()), errors);
                    }
                }
            }
            _ => {}
        }
    }

    fn validate_object(
        &self,
        schema: &Map<String, Value>,
        object: &Map<String, Value>,
        value: &Value,
        path: &str,
        errors: &mut ValidationErrors,
    ) {
        if let Some(rule) = schema.get("required").and_then(RequiredValidator::from_schema) {
            if let Err(missing) = rule.validate(value, path) {
                errors.merge(missing);
            }
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, property_schema) in properties {
                if let Some(property) = object.get(name) {
                    self.validate_node(property_schema, property, &child_path(path, name), errors);
                }
            }
        }
    }

    /// Scalar keyword rules declared on one schema node
    fn keyword_rules(
        &self,
        schema: &Map<String, Value>,
        path: &str,
        errors: &mut ValidationErrors,
    ) -> Vec<Box<dyn ValidationRule>> {
        let mut rules: Vec<Box<dyn ValidationRule>> = Vec::new();

        if let Some(allowed) = schema.get("enum").and_then(Value::as_array) {
            rules.push(Box::new(EnumValidator::new(allowed.clone())));
        }
        if let Some(rule) = LengthValidator::from_schema(schema) {
            rules.push(Box::new(rule));
        }
        if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
            match PatternValidator::new(pattern) {
                Ok(rule) => rules.push(Box::new(rule)),
                Err(err) => errors.add(ValidationError::new(
                    "pattern",
                    path,
                    format!("schema pattern \"{}\" is invalid: {}", pattern, err),
                )),
            }
        }
        if let Some(format) = schema.get("format").and_then(Value::as_str) {
            rules.push(Box::new(FormatValidator::new(format)));
        }
        if let Some(rule) = NumericValidator::from_schema(schema) {
            rules.push(Box::new(rule));
        }

        rules
    }
}

impl Validator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, instance: &Value) -> ValidationResult<()> {
        let mut errors = ValidationErrors::new();
        self.validate_node(schema, instance, "", &mut errors);
        errors.into_result()
    }
}
