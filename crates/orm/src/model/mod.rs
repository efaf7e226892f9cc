//! Model System - definitions, registry-bound handles and records
//!
//! - `definition`: static description of an entity (schema, table options)
//! - `crud_operations`: the `Model` handle with find / create / update / remove
//! - `record`: loaded or constructed instances with change tracking
//! - `lifecycle`: save and destroy
//! - `serialization`: JSON output of record graphs

pub mod crud_operations;
pub mod definition;
pub mod lifecycle;
pub mod record;
pub mod serialization;

pub use crud_operations::{FindOptions, Model, QueryInput};
pub use definition::{ModelConfig, ModelDefinition};
pub use lifecycle::SaveOptions;
pub use record::{Record, Related};
