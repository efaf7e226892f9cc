//! # molti-validation
//!
//! Record validation for the molti ORM. Models describe their fields with a
//! JSON-Schema document; this crate checks instances against that document
//! and reports every failure with the JSON pointer of the offending value.

pub mod error;
pub mod schema;
pub mod traits;
pub mod validators;

// Re-exports for easy access
pub use error::{ValidationError, ValidationErrors, ValidationResult};
pub use schema::JsonSchemaValidator;
pub use traits::{child_path, json_type_name, ValidationRule, Validator};

// Built-in validators
pub use validators::{
    enumeration::EnumValidator,
    format::FormatValidator,
    length::LengthValidator,
    numeric::NumericValidator,
    pattern::PatternValidator,
    required::RequiredValidator,
    types::{coerce_to, TypeValidator},
};
