//! Validation error types and handling

use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// A single keyword failure, addressed by its JSON pointer into the instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationError {
    /// Schema keyword that failed (`required`, `type`, `maxLength`, ...)
    pub keyword: String,
    /// JSON pointer to the failing value, empty for the root object
    pub instance_path: String,
    /// Human-readable error message
    pub message: String,
    /// Keyword parameters (e.g. `{"missingProperty": "name"}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(
        keyword: impl Into<String>,
        instance_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            keyword: keyword.into(),
            instance_path: instance_path.into(),
            message: message.into(),
            params: None,
        }
    }

    /// Attach keyword parameters
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Last segment of the instance path, if any
    pub fn field(&self) -> Option<&str> {
        self.instance_path
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "{} ({})", self.message, self.keyword)
        } else {
            write!(f, "{} {} ({})", self.instance_path, self.message, self.keyword)
        }
    }
}

/// Ordered list of validation failures, in schema evaluation order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Error)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Create a new empty validation errors collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add a single validation error
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Append every error of `other`, keeping order
    pub fn merge(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Errors raised for a given keyword
    pub fn for_keyword<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.errors.iter().filter(move |error| error.keyword == keyword)
    }

    /// Convert to a JSON payload
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "error": {
                "code": "validation_failed",
                "message": "Validation failed",
                "errors": self.errors,
            }
        })
    }

    /// Turn an accumulated collection into a result
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "No validation errors")
        } else {
            write!(f, "Validation failed with {} error(s):", self.errors.len())?;
            for error in &self.errors {
                write!(f, "\n  {}", error)?;
            }
            Ok(())
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self { errors: vec![error] }
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_creation() {
        let error = ValidationError::new("type", "/id", "must be number");
        assert_eq!(error.keyword, "type");
        assert_eq!(error.instance_path, "/id");
        assert_eq!(error.field(), Some("id"));
        assert!(error.params.is_none());
    }

    #[test]
    fn test_root_error_has_no_field() {
        let error = ValidationError::new("required", "", "must have required property 'name'");
        assert_eq!(error.field(), None);
        assert_eq!(error.to_string(), "must have required property 'name' (required)");
    }

    #[test]
    fn test_validation_errors_keep_order() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("required", "", "first"));
        errors.add(ValidationError::new("type", "/age", "second"));

        let mut other = ValidationErrors::new();
        other.add(ValidationError::new("maxLength", "/name", "third"));
        errors.merge(other);

        let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(errors.for_keyword("type").count(), 1);
        assert!(errors.into_result().is_err());
    }
}
