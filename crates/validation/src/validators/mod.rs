//! Built-in keyword validators

pub mod enumeration;
pub mod format;
pub mod length;
pub mod numeric;
pub mod pattern;
pub mod required;
pub mod types;

pub use enumeration::EnumValidator;
pub use format::FormatValidator;
pub use length::LengthValidator;
pub use numeric::NumericValidator;
pub use pattern::PatternValidator;
pub use required::RequiredValidator;
pub use types::TypeValidator;
