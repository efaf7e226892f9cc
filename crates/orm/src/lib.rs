//! # molti-orm: Active-Record ORM with batched relationship loading
//!
//! Models are declared with a [`Schema`] whose `Model` / `Models` fields
//! describe relationships. Definitions are bound to a [`Registry`] holding the
//! shared query backend, and `find` calls can eager-load dotted relationship
//! paths with one query per level:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use molti_orm::*;
//! # async fn run() -> ModelResult<()> {
//! let registry = Registry::new(Arc::new(MemoryBackend::new()));
//! let hospitals = registry.register(ModelDefinition::new(
//!     "Hospital",
//!     Schema::new(Fields::new().field("name", Field::string()).field("doctors", Field::models()))?,
//! ))?;
//! registry.register(ModelDefinition::new(
//!     "Doctor",
//!     Schema::new(Fields::new().field("hospital", Field::model()))?,
//! ))?;
//!
//! let hospital = hospitals.find_by_id(1, FindOptions::with(["doctors"])).await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod model;
pub mod naming;
pub mod query;
pub mod registry;
pub mod relationships;
pub mod schema;

pub use backends::{MemoryBackend, PostgresBackend, QueryBackend, Row};
pub use config::{ConfigError, ConnectionConfig, DatabaseConfig, PoolConfig};
pub use error::{ModelError, ModelResult, OrmError, OrmResult, SchemaError};
pub use model::{FindOptions, Model, ModelConfig, ModelDefinition, QueryInput, Record, Related, SaveOptions};
pub use naming::{guess_column_name, guess_id_column, guess_table_name, pluralize, singularize};
pub use query::{OrderDirection, QueryBuilder, QueryOperator};
pub use registry::Registry;
pub use relationships::{Cardinality, JoinTable, LoadStats, RelationshipDescriptor, RelationshipLoader};
pub use schema::{Field, FieldDefinition, FieldType, Fields, Schema, SchemaBase};

pub use molti_validation::{JsonSchemaValidator, ValidationError, ValidationErrors, Validator};
