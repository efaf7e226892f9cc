//! Error types for the ORM system
//!
//! Provides error handling for schema construction, record validation,
//! relationship resolution and database operations.

use std::fmt;

use molti_validation::ValidationErrors;

use crate::config::ConfigError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone)]
pub enum ModelError {
    /// Database connection or query error
    Database(String),
    /// Query building error
    Query(String),
    /// Schema definition is invalid
    Schema(SchemaError),
    /// Record validation failed; errors are kept in validator order
    Validation(ValidationErrors),
    /// Relationship name is not declared on the entity
    UnknownRelationship { entity: String, relationship: String },
    /// Entity name is not registered
    UnknownEntity(String),
    /// Operation is not available for this entity
    UnsupportedOperation(String),
    /// Primary key is missing or invalid
    MissingPrimaryKey,
    /// Serialization/deserialization error
    Serialization(String),
    /// Configuration error
    Configuration(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Database(msg) => write!(f, "Database error: {}", msg),
            ModelError::Query(msg) => write!(f, "Query error: {}", msg),
            ModelError::Schema(err) => write!(f, "Schema error: {}", err),
            ModelError::Validation(errors) => write!(f, "Validation error: {}", errors),
            ModelError::UnknownRelationship { entity, relationship } => write!(
                f,
                "Relationship '{}' is not defined on model '{}'",
                relationship, entity
            ),
            ModelError::UnknownEntity(name) => write!(f, "Model '{}' is not registered", name),
            ModelError::UnsupportedOperation(msg) => write!(f, "Unsupported operation: {}", msg),
            ModelError::MissingPrimaryKey => write!(f, "Primary key is missing or invalid"),
            ModelError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            ModelError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

impl ModelError {
    /// Validation errors carried by this error, if any
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ModelError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        ModelError::Database(err.to_string())
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<SchemaError> for ModelError {
    fn from(err: SchemaError) -> Self {
        ModelError::Schema(err)
    }
}

impl From<ValidationErrors> for ModelError {
    fn from(errors: ValidationErrors) -> Self {
        ModelError::Validation(errors)
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

/// Error types for schema construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("No type specified for {0}")]
    MissingType(String),

    #[error("Unknown type {type_name}")]
    UnknownType { field: String, type_name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use molti_validation::ValidationError;

    #[test]
    fn test_schema_error_messages() {
        assert_eq!(
            SchemaError::MissingType("name".into()).to_string(),
            "No type specified for name"
        );
        let err = SchemaError::UnknownType {
            field: "name".into(),
            type_name: "Strung".into(),
        };
        assert_eq!(err.to_string(), "Unknown type Strung");
    }

    #[test]
    fn test_validation_conversion_keeps_errors() {
        let errors: ValidationErrors =
            ValidationError::new("required", "", "must have required property 'name'").into();
        let err: ModelError = errors.into();
        assert_eq!(err.validation_errors().map(|e| e.len()), Some(1));
        assert!(err.to_string().starts_with("Validation error"));
    }

    #[test]
    fn test_unknown_relationship_display() {
        let err = ModelError::UnknownRelationship {
            entity: "Parent".into(),
            relationship: "pets".into(),
        };
        assert_eq!(err.to_string(), "Relationship 'pets' is not defined on model 'Parent'");
    }
}
